//! Background deadline monitor.
//!
//! The monitor owns nothing but handles: a shared [`TaskStore`], an
//! [`Announce`] capability, a tick interval, and a cancellation token. Once
//! per tick it captures the current local time, atomically drains every
//! expired task from the store, and announces each one. Because the drain is
//! a single locked operation ([`TaskStore::remove_expired`]), a task is
//! announced at most once even while the menu mutates the store
//! concurrently.
//!
//! The loop never terminates on its own; it runs until the token is
//! cancelled, which `main` does when the menu exits or the process receives
//! a shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::announce::Announce;
use crate::store::TaskStore;

/// Default seconds between monitor ticks.
pub const DEFAULT_TICK_SECS: u64 = 1;

/// Periodically evicts and announces expired tasks.
pub struct DeadlineMonitor {
    /// Shared task collection.
    store: Arc<TaskStore>,

    /// Announcement capability, best-effort.
    announcer: Arc<dyn Announce>,

    /// Time between scans.
    tick: Duration,

    /// Cooperative shutdown signal.
    cancel: CancellationToken,
}

impl DeadlineMonitor {
    /// Creates a monitor over the given store and announcer.
    #[must_use]
    pub fn new(
        store: Arc<TaskStore>,
        announcer: Arc<dyn Announce>,
        tick: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            announcer,
            tick,
            cancel,
        }
    }

    /// Runs the monitor loop until the cancellation token fires.
    ///
    /// The first scan happens immediately, so tasks that expired while the
    /// process was down are evicted and announced at startup.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(tick_secs = self.tick.as_secs(), "Deadline monitor started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Deadline monitor stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.scan(Local::now());
                }
            }
        }
    }

    /// One scan: drain expired tasks, announce each, report save failures.
    fn scan(&self, now: DateTime<Local>) {
        let (expired, saved) = self.store.remove_expired(now);

        for task in &expired {
            info!(id = %task.id, text = %task.text, "Task deadline passed");
            self.announcer
                .announce(&format!("Task {} deadline finished!", task.text));
        }

        if let Err(e) = saved {
            // In-memory state stays authoritative; the next successful save
            // writes the full snapshot.
            warn!(error = %e, "Failed to persist store after expiry");
        }
    }
}
