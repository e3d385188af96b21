//! # State Module
//!
//! Shared handle to the single [`Tracker`] behind every command.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │   ipc::serve ──► commands::* ──┐                                        │
//! │                                │  lock().await                          │
//! │                                ▼                                        │
//! │              ┌──────────────────────────────────┐                       │
//! │              │  TrackerState                    │                       │
//! │              │  Arc<tokio::Mutex<Tracker<S>>>   │                       │
//! │              └────────────────┬─────────────────┘                       │
//! │                               │ KeyValueStore                           │
//! │                               ▼                                         │
//! │              SqliteStore (app)  /  MemoryStore (tests)                  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • One command mutates the ledgers at a time                           │
//! │  • The lock is async so flush() can be awaited while held              │
//! │  • ipc flushes after each command, so a failed write is reported to    │
//! │    the command that issued it                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;

use harvest_core::{Clock, KeyValueStore, MemoryStore, StorageError, SystemClock, Tracker};
use harvest_db::SqliteStore;
use tokio::sync::{Mutex, MutexGuard};

/// A [`KeyValueStore`] whose writes may still be in flight after `set`.
pub trait DurableStore: KeyValueStore {
    /// Resolves once every write issued so far has landed, returning the
    /// first write that did not.
    fn flush_writes(&self) -> impl Future<Output = Result<(), StorageError>>;
}

impl DurableStore for SqliteStore {
    fn flush_writes(&self) -> impl Future<Output = Result<(), StorageError>> {
        async move { self.flush().await.map_err(StorageError::from) }
    }
}

impl DurableStore for MemoryStore {
    fn flush_writes(&self) -> impl Future<Output = Result<(), StorageError>> {
        // writes are synchronous
        async { Ok(()) }
    }
}

/// Cloneable handle to the tracker.
pub struct TrackerState<S: KeyValueStore = SqliteStore, C: Clock = SystemClock> {
    tracker: Arc<Mutex<Tracker<S, C>>>,
}

impl<S: KeyValueStore, C: Clock> Clone for TrackerState<S, C> {
    fn clone(&self) -> Self {
        TrackerState {
            tracker: Arc::clone(&self.tracker),
        }
    }
}

impl<S: KeyValueStore, C: Clock> TrackerState<S, C> {
    pub fn new(tracker: Tracker<S, C>) -> Self {
        TrackerState {
            tracker: Arc::new(Mutex::new(tracker)),
        }
    }

    /// Exclusive access to the tracker.
    pub async fn lock(&self) -> MutexGuard<'_, Tracker<S, C>> {
        self.tracker.lock().await
    }

    /// Runs `f` with read access to the tracker.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let stats = state.with_tracker(|t| t.dashboard()).await;
    /// ```
    pub async fn with_tracker<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Tracker<S, C>) -> R,
    {
        let tracker = self.tracker.lock().await;
        f(&tracker)
    }

    /// Runs `f` with write access to the tracker.
    pub async fn with_tracker_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Tracker<S, C>) -> R,
    {
        let mut tracker = self.tracker.lock().await;
        f(&mut tracker)
    }
}

impl<S: DurableStore, C: Clock> TrackerState<S, C> {
    /// Waits for every queued write to reach the backing store.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let tracker = self.tracker.lock().await;
        tracker.store().flush_writes().await
    }
}
