//! taskchime - terminal task tracker with spoken deadline alerts.
//!
//! # Commands
//!
//! - `taskchime` / `taskchime run`: Start the interactive tracker
//! - `taskchime voices`: List the voices the speech backend offers
//!
//! # Environment Variables
//!
//! See the [`taskchime::config`] module for available configuration options.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use taskchime::announce::{Announce, BellAnnouncer, SpeechAnnouncer};
use taskchime::config::{Config, Overrides};
use taskchime::menu::Menu;
use taskchime::monitor::DeadlineMonitor;
use taskchime::storage::Storage;
use taskchime::store::TaskStore;

/// Graceful shutdown timeout for the deadline monitor.
const SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// taskchime - terminal task tracker with spoken deadline alerts.
///
/// Tracks tasks with absolute deadlines, announces each expiry out loud,
/// and keeps the task list in a local JSON file.
#[derive(Parser, Debug)]
#[command(name = "taskchime")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    TASKCHIME_FILE        Storage file path (default: tasks.json)
    TASKCHIME_TICK_SECS   Seconds between deadline scans (default: 1)
    TASKCHIME_SPEECH_CMD  Text-to-speech command (default: auto-detect)
    TASKCHIME_VOICE       Voice name for the speech command

EXAMPLES:
    # Start the tracker with the default storage file
    taskchime

    # Keep tasks somewhere specific
    taskchime --file ~/chores.json

    # See which voices the speech backend offers
    taskchime voices
")]
struct Cli {
    /// Storage file path.
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Seconds between deadline scans.
    #[arg(long, global = true)]
    tick_secs: Option<u64>,

    /// Text-to-speech command to run for announcements.
    #[arg(long, global = true)]
    speech_cmd: Option<String>,

    /// Voice name passed to the speech command.
    #[arg(long, global = true)]
    voice: Option<String>,

    /// Disable speech; ring the terminal bell instead.
    #[arg(long, global = true)]
    no_speech: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the interactive tracker (the default).
    Run,

    /// List the voices the speech backend offers.
    Voices,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    let config = Config::resolve(Overrides {
        file: cli.file,
        tick_secs: cli.tick_secs,
        speech_cmd: cli.speech_cmd,
        voice: cli.voice,
        no_speech: cli.no_speech,
    })
    .context("Failed to resolve configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    match cli.command {
        Some(Command::Voices) => runtime.block_on(run_voices(&config)),
        Some(Command::Run) | None => runtime.block_on(run_tracker(config)),
    }
}

/// Runs the interactive tracker: monitor in the background, menu in front.
async fn run_tracker(config: Config) -> Result<()> {
    info!(
        file = %config.file.display(),
        tick_secs = config.tick.as_secs(),
        "Starting taskchime"
    );

    let storage = Storage::new(config.file.clone());
    let store = Arc::new(TaskStore::open(storage).with_context(|| {
        format!(
            "Failed to load task storage at {}",
            config.file.display()
        )
    })?);

    let announcer = build_announcer(&config);

    let cancel = CancellationToken::new();
    let monitor = DeadlineMonitor::new(
        Arc::clone(&store),
        announcer,
        config.tick,
        cancel.clone(),
    );
    let monitor_handle = tokio::spawn(monitor.run());

    let menu = Menu::new(store);
    let mut menu_handle = tokio::task::spawn_blocking(move || menu.run());

    tokio::select! {
        menu_result = &mut menu_handle => {
            menu_result.context("Menu thread panicked")??;
            info!("Menu exited, shutting down");
            shutdown_monitor(cancel, monitor_handle).await;
            Ok(())
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received");
            shutdown_monitor(cancel, monitor_handle).await;
            // The menu thread is blocked on stdin and cannot be joined;
            // leave the process rather than wait on input that never comes.
            std::process::exit(0);
        }
    }
}

/// Lists the voices offered by the configured or detected speech backend.
async fn run_voices(config: &Config) -> Result<()> {
    let announcer = match &config.speech_cmd {
        Some(cmd) => SpeechAnnouncer::new(cmd.clone(), None),
        None => match SpeechAnnouncer::detect(None) {
            Some(announcer) => announcer,
            None => {
                eprintln!("No speech backend found on PATH (tried say, espeak, espeak-ng, spd-say).");
                std::process::exit(1);
            }
        },
    };

    let voices = announcer
        .voices()
        .await
        .with_context(|| format!("Failed to list voices via {}", announcer.command()))?;

    if voices.is_empty() {
        println!("{} reports no voices.", announcer.command());
    } else {
        println!("Voices available via {}:", announcer.command());
        for voice in voices {
            println!("- {voice}");
        }
    }
    Ok(())
}

/// Picks the announcement backend for this run.
fn build_announcer(config: &Config) -> Arc<dyn Announce> {
    if config.no_speech {
        info!("Speech disabled, using terminal bell");
        return Arc::new(BellAnnouncer);
    }

    if let Some(cmd) = &config.speech_cmd {
        info!(command = %cmd, "Using configured speech command");
        return Arc::new(SpeechAnnouncer::new(cmd.clone(), config.voice.clone()));
    }

    match SpeechAnnouncer::detect(config.voice.clone()) {
        Some(announcer) => {
            info!(command = %announcer.command(), "Using detected speech backend");
            Arc::new(announcer)
        }
        None => {
            warn!("No speech backend found on PATH, falling back to terminal bell");
            Arc::new(BellAnnouncer)
        }
    }
}

/// Cancels the monitor and waits briefly for it to wind down.
async fn shutdown_monitor(
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
) {
    cancel.cancel();
    if tokio::time::timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), handle)
        .await
        .is_err()
    {
        warn!("Deadline monitor did not stop within the shutdown timeout");
    }
}

/// Initializes the logging subsystem.
///
/// Logs go to stderr so they never interleave with the menu on stdout.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
