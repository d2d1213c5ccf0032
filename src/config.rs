//! Pomodoro settings: defaults, validation and the persisted blob.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Longest interval accepted anywhere: one day.
pub const MAX_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub auto_advance: bool,
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            auto_advance: false,
            sound_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("duration must be between 1 and {max} minutes, got {minutes}", max = MAX_MINUTES)]
    OutOfRange { minutes: u64 },

    #[error("invalid duration '{input}': {reason}")]
    InvalidDuration { input: String, reason: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("settings blob is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings blob is not a JSON object")]
    NotAnObject,
}

/// On-disk shape of the settings, always written with all five fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsBlob {
    pub work_duration: u32,
    pub short_break_duration: u32,
    pub long_break_duration: u32,
    pub auto_start: bool,
    pub sound_enabled: bool,
}

impl From<Settings> for SettingsBlob {
    fn from(settings: Settings) -> Self {
        Self {
            work_duration: settings.work_minutes,
            short_break_duration: settings.short_break_minutes,
            long_break_duration: settings.long_break_minutes,
            auto_start: settings.auto_advance,
            sound_enabled: settings.sound_enabled,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_minutes(u64::from(self.work_minutes))?;
        check_minutes(u64::from(self.short_break_minutes))?;
        check_minutes(u64::from(self.long_break_minutes))?;
        Ok(())
    }

    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&SettingsBlob::from(*self))
    }

    /// Overlays a persisted blob onto `self` one field at a time.
    ///
    /// A field replaces the current value only when it is present, has the
    /// right JSON type and, for durations, is in range. Anything else keeps
    /// the current value, so a half-broken blob still yields usable settings.
    pub fn merge_blob(self, raw: &str) -> Result<Settings, BlobError> {
        let value: Value = serde_json::from_str(raw)?;
        let Value::Object(fields) = value else {
            return Err(BlobError::NotAnObject);
        };

        Ok(Settings {
            work_minutes: minutes_field(&fields, "workDuration").unwrap_or(self.work_minutes),
            short_break_minutes: minutes_field(&fields, "shortBreakDuration")
                .unwrap_or(self.short_break_minutes),
            long_break_minutes: minutes_field(&fields, "longBreakDuration")
                .unwrap_or(self.long_break_minutes),
            auto_advance: bool_field(&fields, "autoStart").unwrap_or(self.auto_advance),
            sound_enabled: bool_field(&fields, "soundEnabled").unwrap_or(self.sound_enabled),
        })
    }
}

fn minutes_field(fields: &Map<String, Value>, key: &str) -> Option<u32> {
    let raw = fields.get(key)?;
    let Some(minutes) = raw.as_u64() else {
        log::warn!("Ignoring persisted {key}: expected a whole number, found {raw}");
        return None;
    };
    match check_minutes(minutes) {
        Ok(minutes) => Some(minutes),
        Err(err) => {
            log::warn!("Ignoring persisted {key}: {err}");
            None
        }
    }
}

fn bool_field(fields: &Map<String, Value>, key: &str) -> Option<bool> {
    let raw = fields.get(key)?;
    let flag = raw.as_bool();
    if flag.is_none() {
        log::warn!("Ignoring persisted {key}: expected true or false, found {raw}");
    }
    flag
}

fn check_minutes(minutes: u64) -> Result<u32, SettingsError> {
    match u32::try_from(minutes) {
        Ok(m) if (1..=MAX_MINUTES).contains(&m) => Ok(m),
        _ => Err(SettingsError::OutOfRange { minutes }),
    }
}

/// Parses a user-entered interval length into whole minutes.
///
/// Accepts a bare number of minutes (`25`) or unit-suffixed input such as
/// `25m`, `1h` or `1h30m`.
pub fn parse_minutes(input: &str) -> Result<u32, SettingsError> {
    let trimmed = input.trim().to_lowercase();
    let invalid = |reason: &'static str| SettingsError::InvalidDuration {
        input: input.trim().to_string(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("a value is required"));
    }

    if let Ok(minutes) = trimmed.parse::<u64>() {
        return check_minutes(minutes);
    }

    let mut total_minutes = 0u64;
    let mut current_number = String::new();

    for ch in trimmed.chars() {
        if ch.is_ascii_digit() {
            current_number.push(ch);
        } else if ch == 'h' || ch == 'm' {
            if current_number.is_empty() {
                return Err(invalid("use formats like 25, 25m, 1h30m"));
            }

            let number: u64 = current_number
                .parse()
                .map_err(|_| invalid("number is too large"))?;

            total_minutes = match ch {
                'h' => number.checked_mul(60),
                _ => Some(number),
            }
            .and_then(|minutes| total_minutes.checked_add(minutes))
            .ok_or_else(|| invalid("number is too large"))?;

            current_number.clear();
        } else if !ch.is_whitespace() {
            return Err(invalid("only digits with 'h' or 'm' are allowed"));
        }
    }

    if !current_number.is_empty() {
        return Err(invalid("a trailing number needs an 'h' or 'm' unit"));
    }

    check_minutes(total_minutes)
}
