//! Shared task collection with exclusive-access mutation.
//!
//! [`TaskStore`] is the single shared mutable resource of the process: the
//! interactive menu mutates it from a blocking thread while the deadline
//! monitor drains it from an async task. Every operation takes the store's
//! mutex, and every structural mutation persists the resulting snapshot via
//! [`Storage`] *while still holding the lock*, so the file on disk always
//! matches the in-memory collection at some instant.
//!
//! # Save failures
//!
//! When a save fails the in-memory mutation stands and the failure is
//! surfaced to the caller ([`StoreError::Persistence`]). Since every save
//! writes the complete snapshot, the next successful save repairs the file;
//! there is no separate retry queue.
//!
//! # Locking
//!
//! The store uses a `std::sync::Mutex`, not an async lock: no method awaits
//! while holding the guard, and callers on both the blocking menu thread and
//! the tokio monitor task block only for the duration of one snapshot write.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::storage::{Storage, StorageError};
use crate::task::Task;

/// Errors returned by store mutations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The targeted task is no longer in the store, typically because the
    /// deadline monitor removed it between render and confirm.
    #[error("task {id} no longer exists")]
    NotFound {
        /// Identifier that failed to resolve.
        id: Uuid,
    },

    /// The mutation was applied in memory but the snapshot save failed.
    #[error("task list updated but not saved: {0}")]
    Persistence(#[source] StorageError),
}

/// The shared, ordered collection of tasks.
#[derive(Debug)]
pub struct TaskStore {
    /// Tasks in insertion order.
    inner: Mutex<Vec<Task>>,

    /// Snapshot persistence gateway.
    storage: Storage,
}

impl TaskStore {
    /// Creates a store over an already-loaded task collection.
    #[must_use]
    pub fn new(storage: Storage, tasks: Vec<Task>) -> Self {
        Self {
            inner: Mutex::new(tasks),
            storage,
        }
    }

    /// Loads the snapshot at the storage path and wraps it in a store.
    ///
    /// # Errors
    ///
    /// Propagates [`StorageError`] from the initial load; a corrupt file is
    /// fatal here rather than silently treated as empty.
    pub fn open(storage: Storage) -> Result<Self, StorageError> {
        let tasks = storage.load()?;
        info!(
            path = %storage.path().display(),
            task_count = tasks.len(),
            "Task store loaded"
        );
        Ok(Self::new(storage, tasks))
    }

    /// Appends a task and persists the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] if the save fails; the task is in
    /// the store regardless.
    pub fn add(&self, task: Task) -> Result<(), StoreError> {
        let mut tasks = self.lock();
        debug!(id = %task.id, text = %task.text, "Adding task");
        tasks.push(task);
        self.save_locked(&tasks)
    }

    /// Returns a snapshot copy of the current tasks, safe to iterate without
    /// holding any lock.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().clone()
    }

    /// Returns the number of tasks currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if the store holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes the task with the given identifier and persists the new
    /// snapshot.
    ///
    /// Identifier-keyed on purpose: the visible list order may have changed
    /// since the caller rendered it, so a positional index could name a
    /// different task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no task has this identifier, or
    /// [`StoreError::Persistence`] if the save fails after removal.
    pub fn remove(&self, id: Uuid) -> Result<Task, StoreError> {
        let mut tasks = self.lock();
        let position = tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound { id })?;
        let removed = tasks.remove(position);
        debug!(id = %removed.id, text = %removed.text, "Removed task");
        self.save_locked(&tasks)?;
        Ok(removed)
    }

    /// Atomically drains every task whose deadline has passed at `now`.
    ///
    /// The check-and-remove pair happens under one lock acquisition, so a
    /// task cannot be drained twice or observed half-removed by the menu.
    /// Returns the removed tasks together with the outcome of the snapshot
    /// save; the removal holds even when the save fails.
    pub fn remove_expired(
        &self,
        now: DateTime<Local>,
    ) -> (Vec<Task>, Result<(), StorageError>) {
        let mut tasks = self.lock();
        let mut expired = Vec::new();
        tasks.retain(|t| {
            if t.is_expired(now) {
                expired.push(t.clone());
                false
            } else {
                true
            }
        });

        if expired.is_empty() {
            return (expired, Ok(()));
        }

        debug!(expired_count = expired.len(), "Drained expired tasks");
        let saved = self.storage.save(&tasks);
        (expired, saved)
    }

    /// Acquires the task lock, recovering from poisoning.
    ///
    /// A panic on either side (menu thread or monitor task) must not wedge
    /// the other; the collection itself is never left half-mutated.
    fn lock(&self) -> MutexGuard<'_, Vec<Task>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persists the locked collection, mapping failures to [`StoreError`].
    fn save_locked(&self, tasks: &[Task]) -> Result<(), StoreError> {
        self.storage.save(tasks).map_err(StoreError::Persistence)
    }
}
