//! archbtrfs - entry point

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use archbtrfs::cli::{Cli, Commands};
use archbtrfs::config::Settings;
use archbtrfs::ui::TuiConsole;
use archbtrfs::{
    FirmwareMode, ProcessGuard, Session, SystemRunner, app, hardware, process_guard, sanity,
};

/// Send tracing output to `path`. The terminal belongs to the TUI.
fn init_logging(path: &Path, level: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => {
            tracing::info!("Loading settings from {}", path.display());
            Settings::load_from_file(path)?
        }
        None => Settings::default(),
    };
    if let Some(log) = &cli.command_log {
        settings.command_log = log.clone();
    }
    settings.validate()?;
    Ok(settings)
}

fn run_menus(
    console: &mut TuiConsole,
    runner: &mut SystemRunner,
    settings: &Settings,
    firmware: FirmwareMode,
    skip_intro: bool,
) -> archbtrfs::Result<()> {
    if !skip_intro && !console.show_intro()? {
        tracing::info!("Quit from the welcome screen");
        return Ok(());
    }
    let mut session = Session::new(console, runner, settings, firmware);
    app::run(&mut session)
}

fn run_tui(cli: &Cli, settings: &Settings) -> Result<()> {
    sanity::run_preflight_checks(cli.dry_run);

    let _guard = ProcessGuard::new();
    let firmware = hardware::detect_firmware_mode();
    tracing::info!(%firmware, dry_run = cli.dry_run, "Starting installer");

    let mut runner = SystemRunner::new(&settings.command_log, cli.dry_run);
    let mut console = TuiConsole::new(cli.dry_run)?;

    let result = run_menus(&mut console, &mut runner, settings, firmware, cli.skip_intro);

    // Always attempt cleanup, even if the menus failed
    console.restore();
    result?;
    tracing::info!("Installer exited");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(&cli.log_file, &cli.log_level)?;
    tracing::info!("archbtrfs {} starting up", env!("CARGO_PKG_VERSION"));

    if let Err(e) = process_guard::init_signal_handlers() {
        tracing::warn!("Failed to initialize signal handlers: {}", e);
    }

    match &cli.command {
        Some(Commands::ValidateConfig { path }) => {
            let settings = Settings::load_from_file(path)?;
            match settings.validate() {
                Ok(()) => println!("Settings file is valid: {}", path.display()),
                Err(e) => {
                    eprintln!("Settings file is invalid: {}", e);
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Some(Commands::PrintConfig) => {
            let settings = load_settings(&cli)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
        None => {
            let settings = load_settings(&cli)?;
            run_tui(&cli, &settings)
        }
    }
}
