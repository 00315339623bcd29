//! idlelock - lock the terminal after a period of inactivity
//!
//! Runs a status view behind a lock overlay. Any key or mouse input counts as
//! activity; once the idle timeout passes the overlay covers the view until
//! the user unlocks it, with a PIN when one is enrolled.

use std::fs::{self, OpenOptions};
use std::io;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use idlelock_core::{AuthenticationGateway, NoSensorGateway};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, EnvFilter};
use zeroize::Zeroizing;

use idlelock_tui::app::{App, TuiConfig, CONFIG_ENV};
use idlelock_tui::auth::{validate, PinGateway, PinStore};

const LOG_FILE_NAME: &str = "idlelock.log";

#[derive(Parser)]
#[command(name = "idlelock")]
#[command(about = "Lock the terminal after a period of inactivity", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ~/.config/idlelock/config.json)
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Idle timeout in milliseconds, overriding the configuration file
    #[arg(short, long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the lockable status view (default)
    Run,

    /// Enroll or replace the unlock PIN
    SetPin,

    /// Remove the unlock PIN; unlocking then needs no challenge
    ClearPin,
}

/// Application entry point with panic handling for terminal restoration
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => TuiConfig::config_file_path()?,
    };

    init_logging(&config_path)?;

    let mut config = TuiConfig::load_or_create(&config_path)?;
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    let pin_path = config.pin_path(&config_path);

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config, &pin_path).await,
        Commands::SetPin => set_pin(&pin_path),
        Commands::ClearPin => clear_pin(&pin_path),
    };

    if let Err(e) = &result {
        tracing::error!("Application error: {}", e);
    }

    result
}

/// Log to a file next to the configuration; the terminal belongs to the UI
fn init_logging(config_path: &Path) -> Result<()> {
    let writer = match config_path.parent() {
        Some(dir) if fs::create_dir_all(dir).is_ok() => {
            match OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE_NAME))
            {
                Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
                Err(_) => BoxMakeWriter::new(io::sink),
            }
        }
        _ => BoxMakeWriter::new(io::sink),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "idlelock_core=info,idlelock_tui=info".into()),
        )
        .init();

    Ok(())
}

/// Main application runner
async fn run(config: TuiConfig, pin_path: &Path) -> Result<()> {
    let store = PinStore::load(pin_path)?;

    let gateway: Arc<dyn AuthenticationGateway>;
    let prompts;
    if store.is_enrolled() {
        let (pin_gateway, rx) = PinGateway::new(store, config.max_pin_attempts);
        gateway = Arc::new(pin_gateway);
        prompts = rx;
    } else {
        tracing::info!("No PIN enrolled; unlocking will not challenge");
        gateway = Arc::new(NoSensorGateway);
        prompts = mpsc::unbounded_channel().1;
    }

    // Set up panic hook to restore terminal on crash
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let mut app = App::new(config.lock_config(), gateway, prompts)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app.shutdown().await;
    result
}

fn set_pin(pin_path: &Path) -> Result<()> {
    let mut store = PinStore::load(pin_path)?;

    let pin = Zeroizing::new(rpassword::prompt_password("New PIN: ")?);
    validate(&pin)?;
    let confirm = Zeroizing::new(rpassword::prompt_password("Confirm PIN: ")?);
    if *pin != *confirm {
        bail!("PINs do not match");
    }

    store.enroll(&pin)?;
    println!("PIN saved to {}", store.path().display());
    Ok(())
}

fn clear_pin(pin_path: &Path) -> Result<()> {
    let mut store = PinStore::load(pin_path)?;
    if !store.is_enrolled() {
        println!("No PIN is set");
        return Ok(());
    }

    store.clear()?;
    println!("PIN removed");
    Ok(())
}
