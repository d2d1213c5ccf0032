//! Terminal front end: key map, status rendering and the run loops.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use crate::config::Settings;
use crate::form::{FormOutcome, SettingsForm};
use crate::format::{format_clock, format_duration, percentage, progress_bar};
use crate::notify::Notifier;
use crate::session::{SessionController, TickOutcome, Transition};
use crate::store::{SettingsStore, save_settings};
use crate::timer::{Due, Ticker};

const BAR_WIDTH: usize = 20;
/// How long the completion banner stays up.
const FLASH: Duration = Duration::from_millis(500);
const IDLE_POLL: Duration = Duration::from_millis(250);
const HINT: &str = "space start/pause · r reset · s settings · q quit";

pub type Controller = SessionController<Box<dyn Notifier>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Reset,
    OpenSettings,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Shortcuts on the timer screen. Not consulted while the settings form is
/// open.
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Command::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char(' ') => Some(Command::Toggle),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Reset),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Command::OpenSettings),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
        _ => None,
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

pub struct App {
    controller: Controller,
    ticker: Ticker,
    store: Box<dyn SettingsStore>,
    form: Option<SettingsForm>,
    flash: Option<(Transition, Instant)>,
    unreported: Option<Transition>,
    notice: Option<String>,
}

impl App {
    pub fn new(controller: Controller, store: Box<dyn SettingsStore>, ticker: Ticker) -> Self {
        Self {
            controller,
            ticker,
            store,
            form: None,
            flash: None,
            unreported: None,
            notice: None,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn store(&self) -> &dyn SettingsStore {
        self.store.as_ref()
    }

    pub fn form(&self) -> Option<&SettingsForm> {
        self.form.as_ref()
    }

    pub fn is_form_open(&self) -> bool {
        self.form.is_some()
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        if is_interrupt(&key) {
            return Flow::Quit;
        }

        if let Some(form) = self.form.as_mut() {
            match form.handle_key(key) {
                FormOutcome::Editing => {}
                FormOutcome::Cancelled => self.form = None,
                FormOutcome::Saved(settings) => {
                    self.form = None;
                    self.save_settings(settings);
                }
            }
            return Flow::Continue;
        }

        match command_for(&key) {
            Some(Command::Toggle) => self.toggle(now),
            Some(Command::Reset) => self.reset(),
            Some(Command::OpenSettings) => {
                self.notice = None;
                self.form = Some(SettingsForm::open(self.controller.settings()));
            }
            Some(Command::Quit) => return Flow::Quit,
            None => {}
        }
        Flow::Continue
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.controller.is_running() {
            self.pause();
        } else {
            self.start(now);
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.ticker.cancel_auto_start();
        if self.controller.start() {
            self.ticker.arm(now);
        }
    }

    pub fn pause(&mut self) {
        self.controller.pause();
        self.ticker.disarm();
        self.ticker.cancel_auto_start();
    }

    pub fn reset(&mut self) {
        self.controller.reset();
        self.ticker.disarm();
        self.ticker.cancel_auto_start();
    }

    /// Applies new settings to the running session and persists them. A
    /// failed save is reported on screen; the settings stay applied.
    pub fn save_settings(&mut self, settings: Settings) {
        self.controller.apply_configuration(settings);
        if !self.controller.auto_start_pending() {
            self.ticker.cancel_auto_start();
        }

        self.notice = Some(match save_settings(self.store.as_mut(), &settings) {
            Ok(()) => "💾 Settings saved".to_string(),
            Err(err) => {
                log::warn!("Could not save settings: {err}");
                format!("⚠️  Settings applied but not saved: {err}")
            }
        });
    }

    /// Delivers every tick and auto-start owed up to `now`.
    pub fn advance(&mut self, now: Instant) {
        if self.flash.is_some_and(|(_, until)| until <= now) {
            self.flash = None;
        }

        while let Some(due) = self.ticker.due(now) {
            match due {
                Due::Tick => match self.controller.tick() {
                    TickOutcome::Counting => {}
                    TickOutcome::Idle => self.ticker.disarm(),
                    TickOutcome::Completed(transition) => {
                        self.ticker.disarm();
                        self.flash = Some((transition, now + FLASH));
                        self.unreported = Some(transition);
                        if self.controller.auto_start_pending() {
                            self.ticker.schedule_auto_start(now);
                        }
                    }
                },
                Due::AutoStart => {
                    if self.controller.fire_auto_start() {
                        self.ticker.arm(now);
                    }
                }
            }
        }
    }

    /// The most recent completion not yet handed out.
    pub fn take_completion(&mut self) -> Option<Transition> {
        self.unreported.take()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let flash_end = self.flash.map(|(_, until)| until);
        match (self.ticker.next_deadline(), flash_end) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn progress_line(&self) -> String {
        let state = self.controller.state();
        let fraction = self.controller.progress_fraction();
        let marker = if state.is_running {
            "▶"
        } else if self.controller.auto_start_pending() {
            "⏭"
        } else {
            "⏸"
        };
        format!(
            "{marker} ⏱️  {} remaining [{}] {}%",
            format_clock(state.seconds_remaining),
            progress_bar(fraction, BAR_WIDTH),
            percentage(fraction)
        )
    }

    pub fn status_lines(&self, now: Instant) -> Vec<String> {
        let state = self.controller.state();
        let kind = state.current_interval;
        let mut lines = vec![
            format!("{} {} · session #{}", kind.emoji(), kind, state.completed_work_sessions),
            String::new(),
            self.progress_line(),
            String::new(),
        ];

        if let Some((transition, until)) = self.flash {
            if now < until {
                lines.push(format!(
                    "✅ {} complete! Next up: {}",
                    transition.finished, transition.next
                ));
            }
        }
        if let Some(notice) = &self.notice {
            lines.push(notice.clone());
        }

        match &self.form {
            Some(form) => {
                lines.push(String::new());
                lines.extend(form.lines());
            }
            None => lines.push(HINT.to_string()),
        }
        lines
    }
}

/// Full-screen keyboard-driven timer. Restores the terminal on the way out,
/// even when the loop fails.
pub fn run_interactive(app: &mut App, interrupted: &AtomicBool) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();

    let result = execute!(stdout, EnterAlternateScreen, Hide)
        .and_then(|()| event_loop(app, &mut stdout, interrupted));

    let restored = execute!(stdout, Show, LeaveAlternateScreen);
    terminal::disable_raw_mode()?;
    result.and(restored)
}

fn event_loop(app: &mut App, out: &mut impl Write, interrupted: &AtomicBool) -> io::Result<()> {
    loop {
        if interrupted.load(Ordering::SeqCst) {
            return Ok(());
        }

        let now = Instant::now();
        app.advance(now);
        draw(out, &app.status_lines(now))?;

        let timeout = wait_until(app.next_deadline());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key, Instant::now()) == Flow::Quit
                {
                    return Ok(());
                }
            }
        }
    }
}

fn draw(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    for (row, line) in lines.iter().enumerate() {
        queue!(
            out,
            MoveTo(0, row as u16),
            Print(line),
            Clear(ClearType::UntilNewLine)
        )?;
    }
    queue!(
        out,
        MoveTo(0, lines.len() as u16),
        Clear(ClearType::FromCursorDown)
    )?;
    out.flush()
}

fn wait_until(deadline: Option<Instant>) -> Duration {
    deadline
        .map(|at| at.saturating_duration_since(Instant::now()))
        .unwrap_or(IDLE_POLL)
        .min(IDLE_POLL)
}

/// Line-mode timer for pipes and dumb terminals: runs the current interval
/// right away and keeps going only while auto-advance is on.
pub fn run_plain(app: &mut App, interrupted: &AtomicBool) -> io::Result<()> {
    let mut stdout = io::stdout();
    let state = app.controller().state();
    let kind = state.current_interval;
    writeln!(
        stdout,
        "{} Starting {} {}...",
        kind.emoji(),
        format_duration(u64::from(state.seconds_remaining)),
        kind.label().to_lowercase()
    )?;
    app.start(Instant::now());

    loop {
        if interrupted.load(Ordering::SeqCst) {
            writeln!(stdout, "\n🛑 Interrupted!")?;
            return Ok(());
        }

        app.advance(Instant::now());
        write!(stdout, "\r{}", app.progress_line())?;
        stdout.flush()?;

        if let Some(transition) = app.take_completion() {
            writeln!(
                stdout,
                "\n{} {} complete! Next up: {}",
                transition.finished.emoji(),
                transition.finished,
                transition.next
            )?;
            if !app.controller().auto_start_pending() {
                return Ok(());
            }
        }

        thread::sleep(wait_until(app.next_deadline()));
    }
}
