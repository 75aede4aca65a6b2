//! Atomic snapshot persistence for the task collection.
//!
//! The storage file holds the complete task collection as one JSON array.
//! Every save rewrites the whole file; there are no partial-task records.
//!
//! # Atomicity
//!
//! Saves write to a sibling temporary file, flush it to disk, then rename it
//! over the target. An interrupted save leaves the previous snapshot intact
//! instead of a truncated file.
//!
//! # Corrupt data
//!
//! A storage file that exists but does not parse is a hard error
//! ([`StorageError::Corrupt`]), never an empty collection: silently treating
//! corrupt data as "no tasks" would discard the user's list on the next
//! save.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use taskchime::storage::Storage;
//!
//! # fn main() -> Result<(), taskchime::storage::StorageError> {
//! let storage = Storage::new(PathBuf::from("tasks.json"));
//! let tasks = storage.load()?;
//! storage.save(&tasks)?;
//! # Ok(())
//! # }
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::task::Task;

/// Suffix appended to the storage path for the temporary write target.
const TMP_SUFFIX: &str = ".tmp";

/// Errors that can occur while loading or saving the storage file.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The storage file exists but does not contain a valid task array.
    ///
    /// Fatal at startup: the task state is unknown and proceeding would risk
    /// overwriting it.
    #[error("corrupt storage file {path}: {source}")]
    Corrupt {
        /// Path of the offending file.
        path: PathBuf,
        /// The underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem I/O failure while reading or writing the snapshot.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the task collection failed.
    #[error("failed to serialize tasks: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Reads and writes the task collection as a single JSON snapshot.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Location of the snapshot file.
    path: PathBuf,
}

impl Storage {
    /// Creates a storage gateway for the given snapshot path.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the snapshot path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the full task collection.
    ///
    /// A missing file is initialized to an empty array and yields an empty
    /// collection. An unreadable or unparseable file is an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] for malformed content and
    /// [`StorageError::Io`] for filesystem failures.
    pub fn load(&self) -> Result<Vec<Task>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Storage file missing, initializing empty");
            self.save(&[])?;
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Saves the full task collection, replacing the previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the temporary file cannot be written
    /// or renamed into place.
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string_pretty(tasks).map_err(StorageError::Serialize)?;

        let tmp_path = self.tmp_path();
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(json.as_bytes())?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        debug!(
            path = %self.path.display(),
            task_count = tasks.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    /// Temporary write target next to the snapshot file.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(TMP_SUFFIX);
        self.path.with_file_name(name)
    }
}
