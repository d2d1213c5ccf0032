//! Completion notifications: the tone played when an interval ends.

use std::f32::consts::PI;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::session::IntervalKind;

const TONE_HZ: f32 = 800.0;
const TONE_SECONDS: f32 = 0.5;
const TONE_SAMPLE_RATE: u32 = 44_100;
const TONE_START_GAIN: f32 = 0.3;
const TONE_END_GAIN: f32 = 0.01;

const PLAYER_GRACE: Duration = Duration::from_millis(200);
const PLAYER_POLL: Duration = Duration::from_millis(10);

/// What just happened, handed to the notifier once per finished interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub finished: IntervalKind,
    pub next: IntervalKind,
    /// Session number of the interval that finished.
    pub session: u32,
    pub sound: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("could not write notification tone: {0}")]
    Tone(#[from] hound::Error),

    #[error("notification output failed: {0}")]
    Io(#[from] io::Error),
}

/// Receives interval completions. Errors are logged by the caller and never
/// stop the session from moving on.
pub trait Notifier {
    fn notify(&mut self, completion: &Completion) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&mut self, completion: &Completion) -> Result<(), NotifyError> {
        (**self).notify(completion)
    }
}

/// Plays a short sine tone through the system audio player, falling back to
/// the terminal bell.
#[derive(Debug)]
pub struct Chime {
    tone_path: PathBuf,
    tone_ready: bool,
}

impl Chime {
    pub fn new(tone_path: PathBuf) -> Self {
        Self {
            tone_path,
            tone_ready: false,
        }
    }

    pub fn default_location() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("pomo")
            .join("tone.wav")
    }

    fn tone(&mut self) -> Result<&Path, NotifyError> {
        if !self.tone_ready {
            if let Some(parent) = self.tone_path.parent() {
                fs::create_dir_all(parent)?;
            }
            write_tone(&self.tone_path)?;
            self.tone_ready = true;
        }
        Ok(&self.tone_path)
    }
}

impl Notifier for Chime {
    fn notify(&mut self, completion: &Completion) -> Result<(), NotifyError> {
        if !completion.sound {
            return Ok(());
        }

        let played = match self.tone() {
            Ok(path) => play_detached(path),
            Err(err) => {
                log::warn!("Falling back to terminal bell: {err}");
                false
            }
        };

        if !played {
            bell()?;
        }
        Ok(())
    }
}

/// Writes an 800 Hz sine tone, half a second long, fading out exponentially.
pub fn write_tone(path: &Path) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: TONE_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total = (TONE_SAMPLE_RATE as f32 * TONE_SECONDS) as u32;

    for n in 0..total {
        let t = n as f32 / TONE_SAMPLE_RATE as f32;
        let gain = TONE_START_GAIN * (TONE_END_GAIN / TONE_START_GAIN).powf(t / TONE_SECONDS);
        let sample = (2.0 * PI * TONE_HZ * t).sin() * gain;
        writer.write_sample((sample * f32::from(i16::MAX)) as i16)?;
    }

    writer.finalize()
}

fn players() -> &'static [&'static str] {
    if cfg!(target_os = "macos") {
        &["afplay"]
    } else if cfg!(target_os = "linux") {
        &["paplay", "aplay"]
    } else {
        &[]
    }
}

/// Spawns the first player that takes the tone and reaps it on a helper
/// thread. A player that exits with an error inside `PLAYER_GRACE` (no sound
/// server, unsupported device) counts as unavailable and the next one is
/// tried.
fn play_detached(path: &Path) -> bool {
    play_with(players(), path)
}

fn play_with(players: &[&str], path: &Path) -> bool {
    players.iter().any(|player| launch(player, path))
}

fn launch(player: &str, path: &Path) -> bool {
    let mut child = match Command::new(player)
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            log::debug!("{player} unavailable: {err}");
            return false;
        }
    };

    let deadline = Instant::now() + PLAYER_GRACE;
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return true,
            Ok(Some(status)) => {
                log::debug!("{player} failed: {status}");
                return false;
            }
            Ok(None) if Instant::now() >= deadline => break,
            Ok(None) => thread::sleep(PLAYER_POLL),
            Err(err) => {
                log::debug!("{player} could not be polled: {err}");
                return false;
            }
        }
    }

    thread::spawn(move || {
        let _ = child.wait();
    });
    true
}

fn bell() -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(b"\x07")?;
    stdout.flush()
}
