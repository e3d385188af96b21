//! # Database Pool
//!
//! Opens the SQLite file that mirrors the tracker's collections.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  [storage] in tracker.toml                                             │
//! │       │  database_path, max_connections, busy_timeout_ms               │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ──► Database::new(config).await                   │
//! │                               │  open pool, apply migrations           │
//! │                               ├──► SqliteStore writer task (writes)    │
//! │                               └──► dashboard refresh task  (reads)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Files are opened in WAL mode so the dashboard's reads never wait on the
//! writer task. Every open applies the embedded migrations, since the
//! `records` table is the only thing the rest of the crate talks to.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::records::RecordRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    /// Private to one connection; used by tests.
    Memory,
}

/// Pool settings taken from the `[storage]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    pub location: DbLocation,
    pub max_connections: u32,
    /// How long a connection waits on a locked file before failing.
    pub busy_timeout: Duration,
}

impl DbConfig {
    /// File-backed database, created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// Throwaway database pinned to a single connection, since every
    /// `:memory:` connection would otherwise see its own empty file.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            max_connections: 1,
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            DbLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            DbLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };
        Ok(options.busy_timeout(self.busy_timeout))
    }

    fn describe(&self) -> String {
        match &self.location {
            DbLocation::File(path) => path.display().to_string(),
            DbLocation::Memory => ":memory:".to_string(),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let target = config.describe();
        info!(database = %target, max_connections = config.max_connections, "Opening record database");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            // a closed in-memory connection takes its data with it
            .min_connections(1)
            .idle_timeout(None)
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(format!("{}: {}", target, e)))?;

        migrations::run_migrations(&pool).await?;
        Ok(Database { pool })
    }

    /// Repository over the `records` table.
    pub fn records(&self) -> RecordRepository {
        RecordRepository::new(self.pool.clone())
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing record database");
        self.pool.close().await;
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
