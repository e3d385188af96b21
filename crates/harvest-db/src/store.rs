//! # SQLite Key/Value Store
//!
//! [`SqliteStore`] implements the tracker's synchronous
//! [`KeyValueStore`] seam over async sqlx.
//!
//! ## Write-Behind Cache
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Tracker (sync)                                                         │
//! │     │ get(key) ─────────────► cache (HashMap)   ← loaded once on open   │
//! │     │ set(key, value) ──┬───► cache                                     │
//! │     │                   └───► mpsc ──► RecordWriter task                │
//! │     │ clear() ──────────┬───► cache.clear()          │                  │
//! │     │                   └───► mpsc ──────────────────┤                  │
//! │     │                                                ▼                  │
//! │     │                                  records().put / clear (sqlx)    │
//! │     │                                                │ Err             │
//! │     │                                                ▼                  │
//! │     └──── next set()/clear()/flush() ◄──── sticky failure slot         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes are applied in the order they were issued. A write that fails in
//! the background is reported by the next call that can return an error;
//! `flush()` waits for every queued write and reports the same way.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use harvest_core::{KeyValueStore, StorageError};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::records::RecordRepository;

// =============================================================================
// Writer
// =============================================================================

enum WriteOp {
    Put { key: String, value: String },
    Clear,
    Flush(oneshot::Sender<()>),
}

type FailureSlot = Arc<Mutex<Option<String>>>;

/// Background task applying queued writes to SQLite.
struct RecordWriter {
    records: RecordRepository,
    rx: mpsc::UnboundedReceiver<WriteOp>,
    failure: FailureSlot,
}

impl RecordWriter {
    /// Runs until every [`SqliteStore`] sender is dropped.
    async fn run(mut self) {
        debug!("Record writer starting");

        while let Some(op) = self.rx.recv().await {
            match op {
                WriteOp::Put { key, value } => {
                    if let Err(e) = self.records.put(&key, &value).await {
                        self.fail(format!("write '{}': {}", key, e));
                    }
                }
                WriteOp::Clear => {
                    if let Err(e) = self.records.clear().await {
                        self.fail(format!("clear: {}", e));
                    }
                }
                WriteOp::Flush(ack) => {
                    // receiver may have given up waiting
                    let _ = ack.send(());
                }
            }
        }

        debug!("Record writer stopped");
    }

    fn fail(&self, message: String) {
        error!(error = %message, "Background record write failed");
        let mut slot = self.failure.lock().unwrap_or_else(|p| p.into_inner());
        // keep the earliest failure
        slot.get_or_insert(message);
    }
}

// =============================================================================
// SqliteStore
// =============================================================================

/// SQLite-backed [`KeyValueStore`].
///
/// Must be opened inside a tokio runtime; the writer task lives as long as
/// the store.
#[derive(Debug)]
pub struct SqliteStore {
    cache: HashMap<String, Value>,
    tx: mpsc::UnboundedSender<WriteOp>,
    failure: FailureSlot,
}

impl SqliteStore {
    /// Loads every stored document and starts the writer task.
    pub async fn open(db: &Database) -> DbResult<Self> {
        let records = db.records();
        let cache = records.load_all().await?;
        info!(collections = cache.len(), "Record store opened");

        let (tx, rx) = mpsc::unbounded_channel();
        let failure: FailureSlot = Arc::default();

        let writer = RecordWriter {
            records,
            rx,
            failure: Arc::clone(&failure),
        };
        tokio::spawn(writer.run());

        Ok(SqliteStore { cache, tx, failure })
    }

    /// Waits until every write issued so far has reached SQLite.
    ///
    /// Returns the first background failure since the last report, if any.
    pub async fn flush(&self) -> DbResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(WriteOp::Flush(ack_tx))
            .map_err(|_| DbError::WriterClosed)?;
        ack_rx.await.map_err(|_| DbError::WriterClosed)?;

        match self.take_failure() {
            Some(message) => Err(DbError::QueryFailed(message)),
            None => Ok(()),
        }
    }

    /// Number of cached collections.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn take_failure(&self) -> Option<String> {
        self.failure
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take()
    }

    fn enqueue(&self, op: WriteOp) -> Result<(), StorageError> {
        self.tx
            .send(op)
            .map_err(|_| StorageError::from(DbError::WriterClosed))
    }

    fn report_failure(&self) -> Result<(), StorageError> {
        match self.take_failure() {
            Some(message) => Err(StorageError::Backend(message)),
            None => Ok(()),
        }
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.cache.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(&value).map_err(|e| StorageError::Encode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        self.cache.insert(key.to_string(), value);
        self.enqueue(WriteOp::Put {
            key: key.to_string(),
            value: encoded,
        })?;
        self.report_failure()
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.cache.clear();
        self.enqueue(WriteOp::Clear)?;
        self.report_failure()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use harvest_core::{Tracker, TrackerSettings};
    use serde_json::json;

    async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_set_is_visible_immediately_and_after_flush() {
        let db = database().await;
        let mut store = SqliteStore::open(&db).await.unwrap();

        store.set("farmers", json!([{ "farmerId": "F1" }])).unwrap();
        assert_eq!(store.get("farmers").unwrap(), Some(json!([{ "farmerId": "F1" }])));

        store.flush().await.unwrap();
        assert_eq!(
            db.records().get("farmers").await.unwrap(),
            Some(json!([{ "farmerId": "F1" }]))
        );
    }

    #[tokio::test]
    async fn test_reopen_loads_previous_documents() {
        let db = database().await;
        {
            let mut store = SqliteStore::open(&db).await.unwrap();
            store.set("orders", json!([])).unwrap();
            store.set("catalog", json!([{ "category": "Small (100g)" }])).unwrap();
            store.flush().await.unwrap();
        }

        let reopened = SqliteStore::open(&db).await.unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get("orders").unwrap(), Some(json!([])));
    }

    #[tokio::test]
    async fn test_clear_orders_after_earlier_writes() {
        let db = database().await;
        let mut store = SqliteStore::open(&db).await.unwrap();

        store.set("a", json!(1)).unwrap();
        store.clear().unwrap();
        store.set("b", json!(2)).unwrap();
        store.flush().await.unwrap();

        let keys: Vec<String> = db
            .records()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["b"]);
        assert!(store.get("a").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_background_failure_is_reported_once() {
        let db = database().await;
        let mut store = SqliteStore::open(&db).await.unwrap();
        db.close().await;

        store.set("farmers", json!([])).unwrap();
        let err = store.flush().await.unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(ref m) if m.contains("farmers")));

        // the slot was drained by flush
        store.flush().await.unwrap();
    }

    #[tokio::test]
    async fn test_background_failure_surfaces_on_next_set() {
        let db = database().await;
        let mut store = SqliteStore::open(&db).await.unwrap();
        db.close().await;

        store.set("farmers", json!([])).unwrap();
        // let the writer process the failing put
        let (ack_tx, ack_rx) = oneshot::channel();
        store.tx.send(WriteOp::Flush(ack_tx)).unwrap();
        ack_rx.await.unwrap();

        let err = store.set("orders", json!([])).unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
    }

    #[tokio::test]
    async fn test_tracker_state_survives_reopen() {
        let db = database().await;
        {
            let store = SqliteStore::open(&db).await.unwrap();
            let mut tracker = Tracker::new(store, TrackerSettings::default()).unwrap();
            tracker.reset().unwrap();
            tracker.store().flush().await.unwrap();
        }

        let store = SqliteStore::open(&db).await.unwrap();
        assert_eq!(store.len(), 7);
        let tracker = Tracker::new(store, TrackerSettings::default()).unwrap();
        assert_eq!(tracker.snapshot().catalog.len(), 7);
    }
}
