//! A terminal Pomodoro timer.
//!
//! The session rules live in [`session`]; everything else feeds it ticks,
//! settings and key presses, and shows what it reports.

pub mod app;
pub mod config;
pub mod form;
pub mod format;
pub mod notify;
pub mod session;
pub mod store;
pub mod timer;

pub use config::{Settings, SettingsError};
pub use notify::{Chime, Completion, Notifier, NotifyError};
pub use session::{IntervalKind, SessionController, SessionState, TickOutcome, Transition};
pub use store::{FileStore, MemoryStore, SettingsStore, StoreError};
