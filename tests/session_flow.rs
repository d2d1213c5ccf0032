use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use pomo::app::{App, Controller};
use pomo::store::{load_settings, read_settings, save_settings};
use pomo::timer::Ticker;
use pomo::{
    Completion, FileStore, IntervalKind, Notifier, NotifyError, SessionController, SessionState,
    Settings, TickOutcome,
};
use tempfile::tempdir;

#[derive(Clone, Default)]
struct Log(Rc<RefCell<Vec<Completion>>>);

impl Notifier for Log {
    fn notify(&mut self, completion: &Completion) -> Result<(), NotifyError> {
        self.0.borrow_mut().push(*completion);
        Ok(())
    }
}

#[test]
fn full_work_interval_lands_on_short_break() {
    let log = Log::default();
    let mut controller = SessionController::new(Settings::default(), log.clone());
    controller.start();

    let completions = (0..1500)
        .filter(|_| matches!(controller.tick(), TickOutcome::Completed(_)))
        .count();

    assert_eq!(completions, 1);
    assert_eq!(log.0.borrow().len(), 1);
    assert_eq!(
        controller.state(),
        SessionState {
            current_interval: IntervalKind::ShortBreak,
            completed_work_sessions: 2,
            seconds_remaining: 300,
            is_running: false,
        }
    );
}

#[test]
fn four_pomodoros_then_long_break() {
    let log = Log::default();
    let mut controller = SessionController::new(Settings::default(), log.clone());

    for _ in 0..8 {
        controller.start();
        while !matches!(controller.tick(), TickOutcome::Completed(_)) {}
    }

    let finished: Vec<IntervalKind> = log.0.borrow().iter().map(|c| c.finished).collect();
    assert_eq!(
        finished,
        vec![
            IntervalKind::Work,
            IntervalKind::ShortBreak,
            IntervalKind::Work,
            IntervalKind::ShortBreak,
            IntervalKind::Work,
            IntervalKind::ShortBreak,
            IntervalKind::Work,
            IntervalKind::LongBreak,
        ]
    );
    assert_eq!(log.0.borrow()[6].next, IntervalKind::LongBreak);
    assert_eq!(controller.state().completed_work_sessions, 5);
}

#[test]
fn settings_survive_a_restart() {
    let dir = tempdir().expect("tempdir");
    let saved = Settings {
        work_minutes: 30,
        short_break_minutes: 6,
        long_break_minutes: 18,
        auto_advance: true,
        sound_enabled: false,
    };

    {
        let mut store = FileStore::new(dir.path());
        let mut controller = SessionController::new(Settings::default(), Log::default());
        controller.apply_configuration(saved);
        save_settings(&mut store, controller.settings()).expect("save");
    }

    let store = FileStore::new(dir.path());
    let mut restarted = SessionController::new(Settings::default(), Log::default());
    restarted.load_persisted_configuration(read_settings(&store).as_deref());

    assert_eq!(*restarted.settings(), saved);
    assert_eq!(load_settings(&store), saved);
    assert_eq!(
        restarted.state().seconds_remaining,
        restarted.duration_minutes(IntervalKind::Work) * 60
    );
}

#[test]
fn app_clock_drives_a_whole_cycle_with_auto_advance() {
    let dir = tempdir().expect("tempdir");
    let settings = Settings {
        work_minutes: 1,
        short_break_minutes: 1,
        auto_advance: true,
        ..Settings::default()
    };
    let log = Log::default();
    let notifier: Box<dyn Notifier> = Box::new(log.clone());
    let controller: Controller = SessionController::new(settings, notifier);
    let mut app = App::new(
        controller,
        Box::new(FileStore::new(dir.path())),
        Ticker::default(),
    );

    let mut now = Instant::now();
    app.start(now);
    for _ in 0..300 {
        now += Duration::from_millis(500);
        app.advance(now);
    }

    // Work ends at 60 s, the break at 121 s, and work resumes at 122 s.
    let state = app.controller().state();
    assert_eq!(log.0.borrow().len(), 2);
    assert_eq!(state.current_interval, IntervalKind::Work);
    assert_eq!(state.completed_work_sessions, 2);
    assert!(state.is_running);
    assert_eq!(state.seconds_remaining, 32);
}
