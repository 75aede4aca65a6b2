//! Configuration for taskchime.
//!
//! Settings resolve in three layers: command-line flag, then environment
//! variable, then built-in default.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TASKCHIME_FILE` | `tasks.json` | Storage file path |
//! | `TASKCHIME_TICK_SECS` | 1 | Seconds between deadline scans |
//! | `TASKCHIME_SPEECH_CMD` | (auto-detect) | Text-to-speech command |
//! | `TASKCHIME_VOICE` | (backend default) | Voice name for the speech command |
//!
//! # Example
//!
//! ```
//! use taskchime::config::{Config, Overrides};
//!
//! let config = Config::resolve(Overrides::default()).expect("valid configuration");
//! assert_eq!(config.tick.as_secs(), 1);
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::monitor::DEFAULT_TICK_SECS;

/// Default storage file, relative to the working directory.
const DEFAULT_FILE: &str = "tasks.json";

/// Environment variable naming the storage file.
const ENV_FILE: &str = "TASKCHIME_FILE";

/// Environment variable for the scan interval in seconds.
const ENV_TICK_SECS: &str = "TASKCHIME_TICK_SECS";

/// Environment variable naming the speech command.
const ENV_SPEECH_CMD: &str = "TASKCHIME_SPEECH_CMD";

/// Environment variable naming the speech voice.
const ENV_VOICE: &str = "TASKCHIME_VOICE";

/// Errors that can occur during configuration resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A setting has an unusable value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// Setting name (flag or environment variable).
        key: String,
        /// What was wrong with it.
        message: String,
    },
}

/// Command-line overrides, applied on top of the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// Storage file path.
    pub file: Option<PathBuf>,

    /// Seconds between deadline scans.
    pub tick_secs: Option<u64>,

    /// Text-to-speech command.
    pub speech_cmd: Option<String>,

    /// Voice name for the speech command.
    pub voice: Option<String>,

    /// Disable speech entirely (terminal bell fallback).
    pub no_speech: bool,
}

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage file holding the task snapshot.
    pub file: PathBuf,

    /// Interval between deadline scans.
    pub tick: Duration,

    /// Explicit speech command, if configured.
    pub speech_cmd: Option<String>,

    /// Voice name passed to the speech backend.
    pub voice: Option<String>,

    /// When `true`, never spawn a speech command.
    pub no_speech: bool,
}

impl Config {
    /// Resolves configuration from overrides, environment, and defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the tick interval is not a
    /// positive integer number of seconds.
    pub fn resolve(overrides: Overrides) -> Result<Self, ConfigError> {
        let file = overrides
            .file
            .or_else(|| env::var(ENV_FILE).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE));

        let tick_secs = match overrides.tick_secs {
            Some(secs) => secs,
            None => match env::var(ENV_TICK_SECS) {
                Ok(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_TICK_SECS.to_string(),
                    message: format!("expected a positive integer, got {raw:?}"),
                })?,
                Err(_) => DEFAULT_TICK_SECS,
            },
        };
        if tick_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: ENV_TICK_SECS.to_string(),
                message: "tick interval must be at least 1 second".to_string(),
            });
        }

        let speech_cmd = overrides.speech_cmd.or_else(|| env::var(ENV_SPEECH_CMD).ok());
        let voice = overrides.voice.or_else(|| env::var(ENV_VOICE).ok());

        Ok(Self {
            file,
            tick: Duration::from_secs(tick_secs),
            speech_cmd,
            voice,
            no_speech: overrides.no_speech,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var(ENV_FILE);
        env::remove_var(ENV_TICK_SECS);
        env::remove_var(ENV_SPEECH_CMD);
        env::remove_var(ENV_VOICE);
    }

    #[test]
    #[serial]
    fn defaults_apply_with_empty_environment() {
        clear_env();
        let config = Config::resolve(Overrides::default()).unwrap();

        assert_eq!(config.file, PathBuf::from("tasks.json"));
        assert_eq!(config.tick, Duration::from_secs(1));
        assert!(config.speech_cmd.is_none());
        assert!(config.voice.is_none());
        assert!(!config.no_speech);
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        clear_env();
        env::set_var(ENV_FILE, "/tmp/chime.json");
        env::set_var(ENV_TICK_SECS, "5");
        env::set_var(ENV_VOICE, "Samantha");

        let config = Config::resolve(Overrides::default()).unwrap();
        assert_eq!(config.file, PathBuf::from("/tmp/chime.json"));
        assert_eq!(config.tick, Duration::from_secs(5));
        assert_eq!(config.voice.as_deref(), Some("Samantha"));

        clear_env();
    }

    #[test]
    #[serial]
    fn flags_override_environment() {
        clear_env();
        env::set_var(ENV_FILE, "/tmp/env.json");
        env::set_var(ENV_TICK_SECS, "5");

        let config = Config::resolve(Overrides {
            file: Some(PathBuf::from("/tmp/flag.json")),
            tick_secs: Some(2),
            ..Overrides::default()
        })
        .unwrap();

        assert_eq!(config.file, PathBuf::from("/tmp/flag.json"));
        assert_eq!(config.tick, Duration::from_secs(2));

        clear_env();
    }

    #[test]
    #[serial]
    fn non_numeric_tick_is_rejected() {
        clear_env();
        env::set_var(ENV_TICK_SECS, "soon");

        let err = Config::resolve(Overrides::default()).unwrap_err();
        assert!(err.to_string().contains(ENV_TICK_SECS));

        clear_env();
    }

    #[test]
    #[serial]
    fn zero_tick_is_rejected() {
        clear_env();

        let err = Config::resolve(Overrides {
            tick_secs: Some(0),
            ..Overrides::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
