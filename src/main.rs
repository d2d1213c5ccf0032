//! Command-line entry point: argument parsing, logging setup and the run loop.

use std::fs::{self, File, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use pomo::app::{self, App};
use pomo::config::{Settings, parse_minutes};
use pomo::store::{self, SETTINGS_KEY};
use pomo::timer::Ticker;
use pomo::{Chime, FileStore, MemoryStore, Notifier, SessionController, SettingsStore};

#[derive(Parser, Debug)]
#[command(
    name = "pomo",
    version,
    about = "🍅 Pomodoro timer for the terminal"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,

    /// Directory holding the saved settings
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the timer (the default)
    Run(RunArgs),
    /// Inspect or change the saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Work length for this run, e.g. 25, 50m, 1h
    #[arg(long, value_parser = parse_minutes)]
    work: Option<u32>,

    /// Short break length for this run
    #[arg(long, value_parser = parse_minutes)]
    short_break: Option<u32>,

    /// Long break length for this run
    #[arg(long, value_parser = parse_minutes)]
    long_break: Option<u32>,

    /// Start the next interval automatically
    #[arg(long)]
    auto_advance: bool,

    /// Do not play the completion tone
    #[arg(long)]
    no_sound: bool,

    /// Print a single progress line instead of the full-screen view
    #[arg(long)]
    plain: bool,

    /// Keep settings changes in memory only
    #[arg(long)]
    ephemeral: bool,
}

impl RunArgs {
    fn apply(&self, settings: Settings) -> Settings {
        Settings {
            work_minutes: self.work.unwrap_or(settings.work_minutes),
            short_break_minutes: self.short_break.unwrap_or(settings.short_break_minutes),
            long_break_minutes: self.long_break.unwrap_or(settings.long_break_minutes),
            auto_advance: settings.auto_advance || self.auto_advance,
            sound_enabled: settings.sound_enabled && !self.no_sound,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective settings as JSON
    Show,
    /// Change and save individual settings
    Set(SetArgs),
    /// Forget the saved settings
    Reset,
}

#[derive(Args, Debug)]
struct SetArgs {
    #[arg(long, value_parser = parse_minutes)]
    work: Option<u32>,

    #[arg(long, value_parser = parse_minutes)]
    short_break: Option<u32>,

    #[arg(long, value_parser = parse_minutes)]
    long_break: Option<u32>,

    #[arg(long, value_name = "BOOL")]
    auto_advance: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    sound: Option<bool>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let run_args = match &cli.command {
        Some(Commands::Run(args)) => Some(args),
        Some(Commands::Config { .. }) => None,
        None => Some(&cli.run),
    };
    let stdin_is_terminal = io::stdin().is_terminal();
    let full_screen = run_args.is_some_and(|args| uses_full_screen(args, stdin_is_terminal));
    init_logging(full_screen.then(log_location));

    let store_dir = cli
        .config_dir
        .clone()
        .unwrap_or_else(FileStore::default_location);

    match cli.command {
        Some(Commands::Config { action }) => config(action, FileStore::new(store_dir)),
        Some(Commands::Run(args)) => run(args, store_dir),
        None => run(cli.run, store_dir),
    }
}

fn run(args: RunArgs, store_dir: PathBuf) -> anyhow::Result<()> {
    let store: Box<dyn SettingsStore> = if args.ephemeral {
        Box::new(MemoryStore::default())
    } else {
        Box::new(FileStore::new(store_dir))
    };

    let notifier: Box<dyn Notifier> = Box::new(Chime::new(Chime::default_location()));
    let mut controller = SessionController::new(Settings::default(), notifier);
    controller.load_persisted_configuration(store::read_settings(&*store).as_deref());

    let settings = args.apply(*controller.settings());
    if settings != *controller.settings() {
        controller.apply_configuration(settings);
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("Error setting Ctrl-C handler")?;

    let mut app = App::new(controller, store, Ticker::default());
    if uses_full_screen(&args, io::stdin().is_terminal()) {
        app::run_interactive(&mut app, &interrupted).context("Terminal UI failed")?;
    } else {
        app::run_plain(&mut app, &interrupted).context("Timer output failed")?;
    }
    Ok(())
}

fn uses_full_screen(args: &RunArgs, stdin_is_terminal: bool) -> bool {
    !args.plain && stdin_is_terminal
}

fn log_location() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pomo")
        .join("pomo.log")
}

/// Logs go to stderr, except under the full-screen view where stderr shares
/// the alternate screen; there they are appended to `log_file` instead.
fn init_logging(log_file: Option<PathBuf>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

    if let Some(path) = log_file {
        match open_log(&path) {
            Ok(file) => {
                builder
                    .target(env_logger::Target::Pipe(Box::new(file)))
                    .write_style(env_logger::WriteStyle::Never);
            }
            // Nowhere safe to write while the screen is taken over.
            Err(_) => {
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }

    builder.init();
}

fn open_log(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn config(action: ConfigAction, mut store: FileStore) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let settings = store::load_settings(&store);
            println!("{}", settings.to_blob()?);
            println!("# {}", store.path_for(SETTINGS_KEY).display());
        }
        ConfigAction::Set(args) => {
            let current = store::load_settings(&store);
            let settings = Settings {
                work_minutes: args.work.unwrap_or(current.work_minutes),
                short_break_minutes: args.short_break.unwrap_or(current.short_break_minutes),
                long_break_minutes: args.long_break.unwrap_or(current.long_break_minutes),
                auto_advance: args.auto_advance.unwrap_or(current.auto_advance),
                sound_enabled: args.sound.unwrap_or(current.sound_enabled),
            };
            settings.validate()?;
            store::save_settings(&mut store, &settings).context("Could not save settings")?;
            println!("{}", settings.to_blob()?);
        }
        ConfigAction::Reset => {
            store
                .remove(SETTINGS_KEY)
                .context("Could not remove saved settings")?;
            println!("Settings reset to defaults");
        }
    }
    Ok(())
}
