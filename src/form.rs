//! Keyboard-driven settings editor shown over the timer.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::{Settings, SettingsError, parse_minutes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Work,
    ShortBreak,
    LongBreak,
    AutoAdvance,
    Sound,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Work,
        Field::ShortBreak,
        Field::LongBreak,
        Field::AutoAdvance,
        Field::Sound,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Work => "Work duration",
            Field::ShortBreak => "Short break",
            Field::LongBreak => "Long break",
            Field::AutoAdvance => "Auto-start next",
            Field::Sound => "Sound",
        }
    }

    fn is_toggle(self) -> bool {
        matches!(self, Field::AutoAdvance | Field::Sound)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Editing,
    Saved(Settings),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct SettingsForm {
    work: String,
    short_break: String,
    long_break: String,
    auto_advance: bool,
    sound_enabled: bool,
    focus: usize,
    error: Option<String>,
}

impl SettingsForm {
    pub fn open(settings: &Settings) -> Self {
        Self {
            work: settings.work_minutes.to_string(),
            short_break: settings.short_break_minutes.to_string(),
            long_break: settings.long_break_minutes.to_string(),
            auto_advance: settings.auto_advance,
            sound_enabled: settings.sound_enabled,
            focus: 0,
            error: None,
        }
    }

    pub fn focus(&self) -> Field {
        Field::ALL[self.focus]
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::Work => Some(self.work.as_str()),
            Field::ShortBreak => Some(self.short_break.as_str()),
            Field::LongBreak => Some(self.long_break.as_str()),
            Field::AutoAdvance | Field::Sound => None,
        }
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Work => Some(&mut self.work),
            Field::ShortBreak => Some(&mut self.short_break),
            Field::LongBreak => Some(&mut self.long_break),
            Field::AutoAdvance | Field::Sound => None,
        }
    }

    fn toggle(&mut self, field: Field) {
        match field {
            Field::AutoAdvance => self.auto_advance = !self.auto_advance,
            Field::Sound => self.sound_enabled = !self.sound_enabled,
            _ => {}
        }
    }

    fn move_focus(&mut self, forward: bool) {
        let len = Field::ALL.len();
        self.focus = if forward {
            (self.focus + 1) % len
        } else {
            (self.focus + len - 1) % len
        };
    }

    /// Every key goes to the form while it is open; nothing here reaches the
    /// timer's own shortcuts.
    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        let field = self.focus();
        match key.code {
            KeyCode::Esc => return FormOutcome::Cancelled,
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return self.submit();
            }
            KeyCode::Tab | KeyCode::Down => self.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(false),
            KeyCode::Enter if field.is_toggle() => self.toggle(field),
            KeyCode::Enter => return self.submit(),
            KeyCode::Char(' ') => self.toggle(field),
            KeyCode::Backspace => {
                if let Some(text) = self.text_mut(field) {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = self.text_mut(field) {
                    text.push(c);
                }
            }
            _ => {}
        }
        FormOutcome::Editing
    }

    pub fn submit(&mut self) -> FormOutcome {
        match self.parse() {
            Ok(settings) => FormOutcome::Saved(settings),
            Err((field, err)) => {
                self.error = Some(format!("{}: {err}", field.label()));
                FormOutcome::Editing
            }
        }
    }

    fn parse(&self) -> Result<Settings, (Field, SettingsError)> {
        let minutes = |field: Field, text: &str| parse_minutes(text).map_err(|err| (field, err));
        Ok(Settings {
            work_minutes: minutes(Field::Work, &self.work)?,
            short_break_minutes: minutes(Field::ShortBreak, &self.short_break)?,
            long_break_minutes: minutes(Field::LongBreak, &self.long_break)?,
            auto_advance: self.auto_advance,
            sound_enabled: self.sound_enabled,
        })
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec!["⚙️  Settings".to_string(), String::new()];
        for (index, field) in Field::ALL.iter().enumerate() {
            let marker = if index == self.focus { '>' } else { ' ' };
            let value = match field {
                Field::AutoAdvance => checkbox(self.auto_advance),
                Field::Sound => checkbox(self.sound_enabled),
                _ => format!("{} min", self.text(*field).unwrap_or_default()),
            };
            lines.push(format!("{marker} {:<16} {value}", field.label()));
        }
        lines.push(String::new());
        if let Some(error) = &self.error {
            lines.push(format!("⚠️  {error}"));
        }
        lines.push("tab move · space toggle · enter/ctrl-s save · esc cancel".to_string());
        lines
    }
}

fn checkbox(checked: bool) -> String {
    let mark = if checked { "[x]" } else { "[ ]" };
    mark.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(form: &mut SettingsForm, text: &str) {
        for c in text.chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn clear(form: &mut SettingsForm) {
        for _ in 0..8 {
            form.handle_key(key(KeyCode::Backspace));
        }
    }

    #[test]
    fn test_opens_with_current_values() {
        let form = SettingsForm::open(&Settings::default());
        assert_eq!(form.text(Field::Work), Some("25"));
        assert_eq!(form.text(Field::ShortBreak), Some("5"));
        assert_eq!(form.text(Field::LongBreak), Some("15"));
        assert_eq!(form.focus(), Field::Work);
    }

    #[test]
    fn test_unchanged_form_saves_same_settings() {
        let settings = Settings {
            auto_advance: true,
            ..Settings::default()
        };
        let mut form = SettingsForm::open(&settings);
        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormOutcome::Saved(settings));
    }

    #[test]
    fn test_edit_every_field() {
        let mut form = SettingsForm::open(&Settings::default());
        clear(&mut form);
        type_text(&mut form, "50");
        form.handle_key(key(KeyCode::Tab));
        clear(&mut form);
        type_text(&mut form, "10m");
        form.handle_key(key(KeyCode::Down));
        clear(&mut form);
        type_text(&mut form, "1h");
        form.handle_key(key(KeyCode::Tab));
        form.handle_key(key(KeyCode::Char(' ')));
        form.handle_key(key(KeyCode::Tab));
        form.handle_key(key(KeyCode::Enter));
        assert_eq!(form.focus(), Field::Sound);

        let outcome = form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(
            outcome,
            FormOutcome::Saved(Settings {
                work_minutes: 50,
                short_break_minutes: 10,
                long_break_minutes: 60,
                auto_advance: true,
                sound_enabled: false,
            })
        );
    }

    #[test]
    fn test_space_on_text_field_is_swallowed() {
        let mut form = SettingsForm::open(&Settings::default());
        assert_eq!(form.handle_key(key(KeyCode::Char(' '))), FormOutcome::Editing);
        assert_eq!(form.text(Field::Work), Some("25"));
    }

    #[test]
    fn test_invalid_duration_keeps_form_open() {
        let mut form = SettingsForm::open(&Settings::default());
        form.handle_key(key(KeyCode::Tab));
        clear(&mut form);
        type_text(&mut form, "0");

        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormOutcome::Editing);
        let error = form.error().expect("error message");
        assert!(error.starts_with("Short break"), "{error}");

        clear(&mut form);
        type_text(&mut form, "abc");
        assert_eq!(form.submit(), FormOutcome::Editing);
    }

    #[test]
    fn test_escape_cancels() {
        let mut form = SettingsForm::open(&Settings::default());
        type_text(&mut form, "0");
        assert_eq!(form.handle_key(key(KeyCode::Esc)), FormOutcome::Cancelled);
    }

    #[test]
    fn test_focus_wraps_backwards() {
        let mut form = SettingsForm::open(&Settings::default());
        form.handle_key(key(KeyCode::BackTab));
        assert_eq!(form.focus(), Field::Sound);
        form.handle_key(key(KeyCode::Up));
        assert_eq!(form.focus(), Field::AutoAdvance);
    }

    #[test]
    fn test_lines_show_focus_and_toggles() {
        let form = SettingsForm::open(&Settings::default());
        let lines = form.lines();
        assert!(lines.iter().any(|l| l.starts_with("> Work duration") && l.ends_with("25 min")));
        assert!(lines.iter().any(|l| l.contains("Sound") && l.ends_with("[x]")));
        assert!(lines.iter().any(|l| l.contains("Auto-start next") && l.ends_with("[ ]")));
    }
}
