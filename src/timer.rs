//! Deadlines for the 1 Hz tick source and the auto-advance delay.

use std::time::{Duration, Instant};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);
/// Pause between an interval finishing and the next one auto-starting.
pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Due {
    Tick,
    AutoStart,
}

/// Tracks when the next tick and the next auto-start are owed.
///
/// There is at most one tick stream: arming an armed ticker keeps the
/// existing deadline, and disarming drops any tick not yet delivered.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    auto_start_delay: Duration,
    next_tick: Option<Instant>,
    auto_start_at: Option<Instant>,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(TICK_PERIOD, AUTO_ADVANCE_DELAY)
    }
}

impl Ticker {
    pub fn new(period: Duration, auto_start_delay: Duration) -> Self {
        Self {
            period,
            auto_start_delay,
            next_tick: None,
            auto_start_at: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn arm(&mut self, now: Instant) {
        if self.next_tick.is_none() {
            self.next_tick = Some(now + self.period);
        }
    }

    pub fn disarm(&mut self) {
        self.next_tick = None;
    }

    pub fn schedule_auto_start(&mut self, now: Instant) {
        self.auto_start_at = Some(now + self.auto_start_delay);
    }

    pub fn cancel_auto_start(&mut self) {
        self.auto_start_at = None;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.next_tick, self.auto_start_at) {
            (Some(tick), Some(start)) => Some(tick.min(start)),
            (tick, start) => tick.or(start),
        }
    }

    /// Pops one event whose deadline has passed. Ticks are rescheduled from
    /// their own deadline, so a late caller drains the backlog one tick per
    /// call.
    pub fn due(&mut self, now: Instant) -> Option<Due> {
        if let Some(at) = self.next_tick.filter(|at| *at <= now) {
            self.next_tick = Some(at + self.period);
            return Some(Due::Tick);
        }
        if self.auto_start_at.is_some_and(|at| at <= now) {
            self.auto_start_at = None;
            return Some(Due::AutoStart);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(ticker: &mut Ticker, now: Instant) -> Vec<Due> {
        std::iter::from_fn(|| ticker.due(now)).collect()
    }

    #[test]
    fn test_nothing_due_when_idle() {
        let mut ticker = Ticker::default();
        let now = Instant::now();
        assert_eq!(ticker.next_deadline(), None);
        assert_eq!(ticker.due(now + Duration::from_secs(60)), None);
    }

    #[test]
    fn test_one_tick_per_period() {
        let mut ticker = Ticker::default();
        let start = Instant::now();
        ticker.arm(start);

        assert_eq!(ticker.due(start + Duration::from_millis(999)), None);
        assert_eq!(drain(&mut ticker, start + Duration::from_secs(1)), vec![Due::Tick]);
        assert_eq!(ticker.next_deadline(), Some(start + Duration::from_secs(2)));
    }

    #[test]
    fn test_rearming_does_not_double_the_cadence() {
        let mut ticker = Ticker::default();
        let start = Instant::now();
        ticker.arm(start);
        ticker.arm(start + Duration::from_millis(500));

        let ticks = drain(&mut ticker, start + Duration::from_millis(3_200));
        assert_eq!(ticks.len(), 3);
    }

    #[test]
    fn test_late_caller_catches_up() {
        let mut ticker = Ticker::default();
        let start = Instant::now();
        ticker.arm(start);
        assert_eq!(drain(&mut ticker, start + Duration::from_secs(5)).len(), 5);
    }

    #[test]
    fn test_disarm_drops_pending_tick() {
        let mut ticker = Ticker::default();
        let start = Instant::now();
        ticker.arm(start);
        ticker.disarm();
        assert!(!ticker.is_armed());
        assert_eq!(ticker.due(start + Duration::from_secs(10)), None);
    }

    #[test]
    fn test_auto_start_fires_once_after_delay() {
        let mut ticker = Ticker::default();
        let done = Instant::now();
        ticker.schedule_auto_start(done);

        assert_eq!(ticker.next_deadline(), Some(done + AUTO_ADVANCE_DELAY));
        assert_eq!(ticker.due(done), None);
        assert_eq!(
            drain(&mut ticker, done + AUTO_ADVANCE_DELAY),
            vec![Due::AutoStart]
        );
    }

    #[test]
    fn test_cancelled_auto_start_never_fires() {
        let mut ticker = Ticker::default();
        let done = Instant::now();
        ticker.schedule_auto_start(done);
        ticker.cancel_auto_start();
        assert_eq!(ticker.due(done + Duration::from_secs(5)), None);
    }
}
