//! Best-effort audible announcements.
//!
//! The deadline monitor talks to the outside world through the [`Announce`]
//! trait: fire-and-forget, never blocking the caller, failures logged and
//! swallowed. Two implementations ship with the binary:
//!
//! - [`SpeechAnnouncer`] spawns an external text-to-speech command
//!   (`say`, `espeak`, `espeak-ng`, or `spd-say`, auto-detected on `PATH`
//!   or configured explicitly) and reaps it in a detached task with a
//!   bounded wait.
//! - [`BellAnnouncer`] rings the terminal bell and prints the announcement
//!   to stderr; used when no speech backend is available or speech is
//!   disabled.
//!
//! [`SpeechAnnouncer::voices`] lists the voices the backend offers, feeding
//! the `voices` CLI subcommand.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// How long a spawned speech process may run before being given up on.
const SPEECH_TIMEOUT_SECS: u64 = 10;

/// Speech commands probed, in preference order.
const SPEECH_CANDIDATES: &[&str] = &["say", "espeak", "espeak-ng", "spd-say"];

/// Errors from the speech backend.
#[derive(Error, Debug)]
pub enum AnnounceError {
    /// The speech command could not be started.
    #[error("failed to run {command}: {source}")]
    Spawn {
        /// Command that failed to start.
        command: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The voice-listing invocation exited unsuccessfully.
    #[error("{command} could not list voices (exit status {status})")]
    Listing {
        /// Command that was invoked.
        command: String,
        /// Its exit status.
        status: std::process::ExitStatus,
    },
}

/// Capability to announce a line of text to the user.
///
/// Implementations must return promptly: any real work (process spawning,
/// audio output) happens in the background. Failures are non-fatal to the
/// caller by contract.
pub trait Announce: Send + Sync {
    /// Announces `text`, best-effort.
    fn announce(&self, text: &str);
}

/// Announcer backed by an external text-to-speech command.
///
/// Must be used from within a tokio runtime: each announcement spawns the
/// speech process and a detached reaper task.
#[derive(Debug, Clone)]
pub struct SpeechAnnouncer {
    /// The speech command to invoke.
    command: String,

    /// Optional voice name passed to the backend.
    voice: Option<String>,
}

impl SpeechAnnouncer {
    /// Creates an announcer for an explicitly configured command.
    #[must_use]
    pub fn new(command: String, voice: Option<String>) -> Self {
        Self { command, voice }
    }

    /// Probes `PATH` for a known speech command.
    ///
    /// Returns `None` when no backend is installed; callers fall back to
    /// [`BellAnnouncer`].
    #[must_use]
    pub fn detect(voice: Option<String>) -> Option<Self> {
        let command = SPEECH_CANDIDATES
            .iter()
            .find(|c| find_in_path(c).is_some())?;
        debug!(command, "Detected speech backend");
        Some(Self::new((*command).to_string(), voice))
    }

    /// Returns the backing command name.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Lists the voices the backend offers, one name per entry.
    ///
    /// # Errors
    ///
    /// Returns [`AnnounceError::Spawn`] if the command cannot run and
    /// [`AnnounceError::Listing`] if it exits unsuccessfully.
    pub async fn voices(&self) -> Result<Vec<String>, AnnounceError> {
        let output = Command::new(&self.command)
            .args(voice_listing_args(&self.command))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| AnnounceError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AnnounceError::Listing {
                command: self.command.clone(),
                status: output.status,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_voice_listing(&self.command, &stdout))
    }
}

impl Announce for SpeechAnnouncer {
    fn announce(&self, text: &str) {
        let mut cmd = Command::new(&self.command);
        if let Some(voice) = &self.voice {
            cmd.arg(voice_flag(&self.command)).arg(voice);
        }
        cmd.arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let command = self.command.clone();
        match cmd.spawn() {
            Ok(mut child) => {
                // Reap in the background; the monitor tick must not wait on
                // audio playback.
                tokio::spawn(async move {
                    let wait = tokio::time::timeout(
                        Duration::from_secs(SPEECH_TIMEOUT_SECS),
                        child.wait(),
                    )
                    .await;
                    match wait {
                        Ok(Ok(status)) if status.success() => {}
                        Ok(Ok(status)) => {
                            warn!(%command, %status, "Speech command exited with failure");
                        }
                        Ok(Err(e)) => {
                            warn!(%command, error = %e, "Failed to wait on speech command");
                        }
                        Err(_) => {
                            warn!(%command, "Speech command timed out, killing");
                            let _ = child.kill().await;
                        }
                    }
                });
            }
            Err(e) => {
                warn!(%command, error = %e, "Failed to spawn speech command");
            }
        }
    }
}

/// Announcer that rings the terminal bell instead of speaking.
#[derive(Debug, Default, Clone, Copy)]
pub struct BellAnnouncer;

impl Announce for BellAnnouncer {
    fn announce(&self, text: &str) {
        // BEL plus the text on stderr; stdout belongs to the menu.
        eprintln!("\x07{text}");
    }
}

/// Voice-selection flag for a given backend.
fn voice_flag(command: &str) -> &'static str {
    match basename(command) {
        "spd-say" => "-y",
        _ => "-v",
    }
}

/// Arguments that make a backend print its voice inventory.
fn voice_listing_args(command: &str) -> Vec<&'static str> {
    match basename(command) {
        "say" => vec!["-v", "?"],
        "spd-say" => vec!["-L"],
        // espeak and espeak-ng share the flag.
        _ => vec!["--voices"],
    }
}

/// Extracts voice names from a backend's listing output.
///
/// Every supported backend prints one voice per line with the name in a
/// leading column, preceded by a header line for some of them. The name
/// column is taken as-is; header lines are dropped where recognizable.
fn parse_voice_listing(command: &str, stdout: &str) -> Vec<String> {
    let skip_header = matches!(basename(command), "espeak" | "espeak-ng" | "spd-say");

    stdout
        .lines()
        .skip(usize::from(skip_header))
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return None;
            }
            match basename(command) {
                // `espeak --voices` columns: Pty Language Age/Gender VoiceName ...
                "espeak" | "espeak-ng" => trimmed.split_whitespace().nth(3),
                // `say -v ?` and `spd-say -L` lead with the name.
                _ => trimmed.split_whitespace().next(),
            }
            .map(str::to_string)
        })
        .collect()
}

/// Last path component of a command string.
fn basename(command: &str) -> &str {
    Path::new(command)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(command)
}

/// Searches `PATH` for an executable with the given name.
fn find_in_path(command: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(command))
        .find(|candidate| candidate.is_file())
}
