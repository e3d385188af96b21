//! # harvest-db: SQLite Persistence for Harvest Ledger
//!
//! Implements the tracker's [`KeyValueStore`](harvest_core::KeyValueStore)
//! seam on top of a single SQLite table.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Harvest Ledger Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 harvest-core (Tracker)                          │   │
//! │  │         store.get / store.set / store.clear  (sync)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ harvest-db (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   SqliteStore ── cache hit ──► HashMap<String, Value>           │   │
//! │  │        │                                                        │   │
//! │  │        └── mpsc ──► writer task ──► RecordRepository            │   │
//! │  │                                         │                       │   │
//! │  │   Database (SqlitePool, WAL) ◄──────────┘                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │                        ┌───────▼───────┐                               │
//! │                        │ harvest.db    │  records(key, value, ...)     │
//! │                        └───────────────┘                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let db = Database::new(DbConfig::new("./harvest.db")).await?;
//! let store = SqliteStore::open(&db).await?;
//! let tracker = Tracker::new(store, TrackerSettings::default())?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};
pub use repository::records::{RecordRepository, StoredRecord};
pub use store::SqliteStore;
