//! Task model and deadline grammar.
//!
//! A [`Task`] couples a display string with an absolute local-time deadline
//! and a stable [`Uuid`] identifier. The identifier is what delete and
//! remove operations are keyed by: two tasks may share text and deadline,
//! and the store may be mutated concurrently between the moment a task is
//! rendered and the moment the user acts on it, so positions are never a
//! safe handle.
//!
//! # Storage shape
//!
//! Tasks serialize to the storage file as:
//!
//! ```json
//! {"id": "4dd7…", "text": "Buy milk", "deadline": "2026-08-06T12:00:00+02:00"}
//! ```
//!
//! Files written before identifiers existed still load: a missing `id`
//! deserializes to a freshly generated v4 UUID.

use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Accepted deadline input format, seconds included.
const DEADLINE_FORMAT_FULL: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted deadline input format without seconds.
const DEADLINE_FORMAT_MINUTES: &str = "%Y-%m-%d %H:%M";

/// Human-readable description of the accepted deadline grammar, used in
/// prompts and error messages.
pub const DEADLINE_FORMAT_HINT: &str = "YYYY-MM-DD HH:MM[:SS]";

/// Errors produced when parsing user-entered deadlines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeadlineError {
    /// Input does not match the documented grammar.
    #[error("invalid deadline {input:?}, expected {DEADLINE_FORMAT_HINT}")]
    Unparseable {
        /// The rejected input.
        input: String,
    },

    /// The wall-clock time does not exist in the local timezone
    /// (skipped by a DST transition).
    #[error("deadline {input:?} does not exist in the local timezone")]
    NonexistentLocalTime {
        /// The rejected input.
        input: String,
    },
}

/// A tracked task with an expiry deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable identifier assigned at creation.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Display text describing the task.
    pub text: String,

    /// Absolute local timestamp after which the task is expired.
    pub deadline: DateTime<Local>,
}

impl Task {
    /// Creates a new task with a freshly generated identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{Duration, Local};
    /// use taskchime::task::Task;
    ///
    /// let task = Task::new("Buy milk".to_string(), Local::now() + Duration::hours(1));
    /// assert_eq!(task.text, "Buy milk");
    /// assert!(!task.is_expired(Local::now()));
    /// ```
    #[must_use]
    pub fn new(text: String, deadline: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            deadline,
        }
    }

    /// Returns `true` if the deadline has passed at `now`.
    ///
    /// A deadline exactly equal to `now` counts as expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Local>) -> bool {
        self.deadline <= now
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (due {})",
            self.text,
            self.deadline.format(DEADLINE_FORMAT_FULL)
        )
    }
}

/// Parses a user-entered deadline in the documented grammar.
///
/// Accepts `YYYY-MM-DD HH:MM` with optional `:SS`, interpreted as local
/// wall-clock time. When a DST transition makes the wall time ambiguous the
/// earlier instant is chosen; wall times skipped by a transition are
/// rejected.
///
/// # Errors
///
/// Returns [`DeadlineError::Unparseable`] when the input does not match the
/// grammar, and [`DeadlineError::NonexistentLocalTime`] for wall times that
/// do not exist locally.
///
/// # Examples
///
/// ```
/// use taskchime::task::parse_deadline;
///
/// assert!(parse_deadline("2026-08-06 12:30").is_ok());
/// assert!(parse_deadline("2026-08-06 12:30:45").is_ok());
/// assert!(parse_deadline("tomorrow").is_err());
/// ```
pub fn parse_deadline(input: &str) -> Result<DateTime<Local>, DeadlineError> {
    let trimmed = input.trim();

    let naive = NaiveDateTime::parse_from_str(trimmed, DEADLINE_FORMAT_FULL)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, DEADLINE_FORMAT_MINUTES))
        .map_err(|_| DeadlineError::Unparseable {
            input: trimmed.to_string(),
        })?;

    naive
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(|| DeadlineError::NonexistentLocalTime {
            input: trimmed.to_string(),
        })
}
