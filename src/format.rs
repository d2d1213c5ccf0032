//! Text helpers for clocks, durations and progress bars.

/// `mm:ss`, both parts zero-padded to two digits.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Spelled-out length such as `25 minutes` or `1 minute 5 seconds`. Zero
/// parts are left out unless the whole duration is zero.
pub fn format_duration(seconds: u64) -> String {
    let parts: Vec<String> = [(seconds / 60, "minute"), (seconds % 60, "second")]
        .into_iter()
        .filter(|&(count, _)| count > 0)
        .map(|(count, unit)| counted(count, unit))
        .collect();

    if parts.is_empty() {
        counted(0, "second")
    } else {
        parts.join(" ")
    }
}

fn counted(count: u64, unit: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {unit}{suffix}")
}

pub fn percentage(fraction: f64) -> u8 {
    (fraction.clamp(0.0, 1.0) * 100.0) as u8
}

pub fn progress_bar(fraction: f64, width: usize) -> String {
    let filled_blocks = ((fraction.clamp(0.0, 1.0) * width as f64) as usize).min(width);
    let empty_blocks = width - filled_blocks;
    format!("{}{}", "█".repeat(filled_blocks), "░".repeat(empty_blocks))
}
