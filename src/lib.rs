//! taskchime - terminal task tracker with spoken deadline alerts.
//!
//! This crate provides a single-user task tracker: an interactive terminal
//! menu for adding, viewing, and deleting tasks, alongside a background
//! monitor that evicts tasks whose deadlines have passed and announces each
//! expiry out loud.
//!
//! # Overview
//!
//! The menu (foreground, blocking on console input) and the deadline
//! monitor (background, timer-driven) run concurrently for the lifetime of
//! the process and share one [`store::TaskStore`]. Every mutation persists
//! the full task collection to a JSON snapshot file, so the file always
//! reloads to the in-memory set.
//!
//! # Modules
//!
//! - [`task`]: Task model and deadline grammar
//! - [`storage`]: Atomic JSON snapshot persistence
//! - [`store`]: Shared mutex-guarded task collection
//! - [`monitor`]: Background expiry loop with cancellation
//! - [`announce`]: Text-to-speech boundary and terminal-bell fallback
//! - [`menu`]: Interactive menu loop
//! - [`config`]: Flag and environment configuration
//! - [`error`]: Error types for taskchime operations

pub mod announce;
pub mod config;
pub mod error;
pub mod menu;
pub mod monitor;
pub mod storage;
pub mod store;
pub mod task;

pub use announce::{Announce, AnnounceError, BellAnnouncer, SpeechAnnouncer};
pub use config::{Config, ConfigError, Overrides};
pub use error::{ChimeError, Result};
pub use menu::Menu;
pub use monitor::{DeadlineMonitor, DEFAULT_TICK_SECS};
pub use storage::{Storage, StorageError};
pub use store::{StoreError, TaskStore};
pub use task::{parse_deadline, DeadlineError, Task, DEADLINE_FORMAT_HINT};
