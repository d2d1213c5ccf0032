//! The Pomodoro session state machine.
//!
//! [`SessionController`] owns the settings and the countdown. It never reads
//! the clock: the caller delivers one [`SessionController::tick`] per elapsed
//! second while the controller reports itself as running.

use std::fmt;

use crate::config::Settings;
use crate::notify::{Completion, Notifier};

/// Every Nth finished work interval is followed by a long break.
pub const LONG_BREAK_EVERY: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalKind {
    Work,
    ShortBreak,
    LongBreak,
}

impl IntervalKind {
    pub fn label(self) -> &'static str {
        match self {
            IntervalKind::Work => "Work Session",
            IntervalKind::ShortBreak => "Short Break",
            IntervalKind::LongBreak => "Long Break",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            IntervalKind::Work => "🍅",
            IntervalKind::ShortBreak => "☕",
            IntervalKind::LongBreak => "🌴",
        }
    }

    /// The interval that follows `self` when it finishes as session number
    /// `session` (the count before it is incremented).
    pub fn next(self, session: u32) -> IntervalKind {
        match self {
            IntervalKind::Work if session % LONG_BREAK_EVERY == 0 => IntervalKind::LongBreak,
            IntervalKind::Work => IntervalKind::ShortBreak,
            IntervalKind::ShortBreak | IntervalKind::LongBreak => IntervalKind::Work,
        }
    }
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Read-only snapshot of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub current_interval: IntervalKind,
    /// Number of the current work session, starting at 1. Incremented each
    /// time a work interval finishes.
    pub completed_work_sessions: u32,
    pub seconds_remaining: u32,
    pub is_running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub finished: IntervalKind,
    pub next: IntervalKind,
    pub session: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The controller is paused; the tick was ignored.
    Idle,
    Counting,
    Completed(Transition),
}

/// Share of the interval already elapsed, in `[0, 1]`.
///
/// A zero-length interval counts as finished.
pub fn progress_fraction(total_seconds: u32, seconds_remaining: u32) -> f64 {
    if total_seconds == 0 {
        return 1.0;
    }
    let elapsed = total_seconds.saturating_sub(seconds_remaining);
    f64::from(elapsed) / f64::from(total_seconds)
}

pub struct SessionController<N> {
    settings: Settings,
    state: SessionState,
    notifier: N,
    auto_start_pending: bool,
}

impl<N: Notifier> SessionController<N> {
    pub fn new(settings: Settings, notifier: N) -> Self {
        let mut controller = Self {
            settings,
            state: SessionState {
                current_interval: IntervalKind::Work,
                completed_work_sessions: 1,
                seconds_remaining: 0,
                is_running: false,
            },
            notifier,
            auto_start_pending: false,
        };
        controller.state.seconds_remaining = controller.total_seconds();
        controller
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn auto_start_pending(&self) -> bool {
        self.auto_start_pending
    }

    /// Configured length of `kind`, never less than one minute.
    pub fn duration_minutes(&self, kind: IntervalKind) -> u32 {
        let minutes = match kind {
            IntervalKind::Work => self.settings.work_minutes,
            IntervalKind::ShortBreak => self.settings.short_break_minutes,
            IntervalKind::LongBreak => self.settings.long_break_minutes,
        };
        minutes.max(1)
    }

    pub fn total_seconds(&self) -> u32 {
        self.duration_minutes(self.state.current_interval) * 60
    }

    pub fn progress_fraction(&self) -> f64 {
        progress_fraction(self.total_seconds(), self.state.seconds_remaining)
    }

    /// Starts the countdown. Returns `false` when it was already running, in
    /// which case nothing changes.
    pub fn start(&mut self) -> bool {
        self.auto_start_pending = false;
        if self.state.is_running {
            return false;
        }
        self.state.is_running = true;
        log::debug!(
            "Started {} with {}s remaining",
            self.state.current_interval,
            self.state.seconds_remaining
        );
        true
    }

    pub fn pause(&mut self) {
        self.auto_start_pending = false;
        self.state.is_running = false;
    }

    /// Restarts the current interval from its full length, paused.
    pub fn reset(&mut self) {
        self.pause();
        self.state.seconds_remaining = self.total_seconds();
    }

    /// Starts the countdown if a completion left an auto-start pending.
    pub fn fire_auto_start(&mut self) -> bool {
        if !self.auto_start_pending {
            return false;
        }
        self.start()
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.is_running {
            return TickOutcome::Idle;
        }

        self.state.seconds_remaining = self.state.seconds_remaining.saturating_sub(1);
        if self.state.seconds_remaining == 0 {
            TickOutcome::Completed(self.complete_interval())
        } else {
            TickOutcome::Counting
        }
    }

    /// Ends the current interval: pauses, notifies, and moves to the next
    /// interval at its full length.
    pub fn complete_interval(&mut self) -> Transition {
        self.pause();

        let finished = self.state.current_interval;
        let session = self.state.completed_work_sessions;
        let next = finished.next(session);

        let completion = Completion {
            finished,
            next,
            session,
            sound: self.settings.sound_enabled,
        };
        if let Err(err) = self.notifier.notify(&completion) {
            log::warn!("Completion notification failed: {err}");
        }

        if finished == IntervalKind::Work {
            self.state.completed_work_sessions += 1;
        }
        self.switch_to(next);

        if self.settings.auto_advance {
            self.auto_start_pending = true;
        }

        log::debug!("{finished} #{session} complete, next {next}");
        Transition {
            finished,
            next,
            session,
        }
    }

    fn switch_to(&mut self, kind: IntervalKind) {
        self.state.current_interval = kind;
        self.state.seconds_remaining = self.total_seconds();
    }

    /// Replaces all settings. A paused countdown is resized to the new length
    /// of the current interval; a running one keeps its remaining time.
    pub fn apply_configuration(&mut self, settings: Settings) {
        self.settings = settings;
        if !settings.auto_advance {
            self.auto_start_pending = false;
        }
        if !self.state.is_running {
            self.state.seconds_remaining = self.total_seconds();
        }
    }

    /// Overlays a persisted settings blob onto the defaults. Malformed blobs
    /// are logged and leave the current settings untouched.
    pub fn load_persisted_configuration(&mut self, raw: Option<&str>) {
        let Some(raw) = raw else {
            return;
        };

        match Settings::default().merge_blob(raw) {
            Ok(settings) => {
                self.settings = settings;
                self.state.seconds_remaining = self.total_seconds();
                log::info!("Loaded persisted settings: {settings:?}");
            }
            Err(err) => log::warn!("Ignoring persisted settings: {err}"),
        }
    }
}
