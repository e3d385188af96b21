//! # Record Repository
//!
//! Each tracker collection is one row: `key` is the collection name
//! (`farmers`, `orders`, ...) and `value` its JSON document.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use harvest_core::{KeyValueStore, MemoryStore};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Raw row from the `records` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredRecord {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Parses the stored document.
    pub fn json(&self) -> DbResult<Value> {
        serde_json::from_str(&self.value).map_err(|e| DbError::serialization(&self.key, e))
    }
}

/// Repository for collection documents.
#[derive(Debug, Clone)]
pub struct RecordRepository {
    pool: SqlitePool,
}

impl RecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RecordRepository { pool }
    }

    /// Fetches and parses the document stored under `key`.
    pub async fn get(&self, key: &str) -> DbResult<Option<Value>> {
        let row = sqlx::query_as::<_, StoredRecord>(
            "SELECT key, value, updated_at FROM records WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|record| record.json()).transpose()
    }

    /// Like [`get`](Self::get) but a missing key is an error.
    pub async fn require(&self, key: &str) -> DbResult<Value> {
        self.get(key)
            .await?
            .ok_or_else(|| DbError::not_found("Record", key))
    }

    /// Inserts or replaces the document under `key`.
    ///
    /// `value` must already be serialized JSON.
    pub async fn put(&self, key: &str, value: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO records (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(key = %key, bytes = value.len(), "Record written");
        Ok(())
    }

    /// Removes `key`. Returns whether a row existed.
    pub async fn delete(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM records WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Every stored row, ordered by key.
    pub async fn list(&self) -> DbResult<Vec<StoredRecord>> {
        let rows = sqlx::query_as::<_, StoredRecord>(
            "SELECT key, value, updated_at FROM records ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Every document, parsed.
    pub async fn load_all(&self) -> DbResult<HashMap<String, Value>> {
        self.list()
            .await?
            .into_iter()
            .map(|record| -> DbResult<(String, Value)> {
                let value = record.json()?;
                Ok((record.key, value))
            })
            .collect()
    }

    /// Copies every document into a fresh [`MemoryStore`].
    ///
    /// Lets read-only consumers rebuild a `Snapshot` without touching the
    /// tracker that owns the live store.
    pub async fn mirror(&self) -> DbResult<MemoryStore> {
        let mut store = MemoryStore::new();
        for (key, value) in self.load_all().await? {
            store
                .set(&key, value)
                .map_err(|e| DbError::Internal(e.to_string()))?;
        }
        Ok(store)
    }

    /// Deletes every row. Returns the number removed.
    pub async fn clear(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM records")
            .execute(&self.pool)
            .await?;

        debug!(removed = result.rows_affected(), "Records cleared");
        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use serde_json::json;

    async fn repo() -> RecordRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().records()
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let repo = repo().await;
        repo.put("farmers", r#"[{"farmerId":"F1"}]"#).await.unwrap();

        let value = repo.get("farmers").await.unwrap();
        assert_eq!(value, Some(json!([{ "farmerId": "F1" }])));
        assert_eq!(repo.get("orders").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_key() {
        let repo = repo().await;
        repo.put("orders", "[]").await.unwrap();
        repo.put("orders", r#"[{"orderId":"O1"}]"#).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.require("orders").await.unwrap()[0]["orderId"], "O1");
    }

    #[tokio::test]
    async fn test_require_missing_key() {
        let repo = repo().await;
        let err = repo.require("catalog").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_value_is_serialization_error() {
        let repo = repo().await;
        repo.put("purchases", "{not json").await.unwrap();

        let err = repo.get("purchases").await.unwrap_err();
        assert!(matches!(err, DbError::Serialization { ref key, .. } if key == "purchases"));
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let repo = repo().await;
        repo.put("a", "1").await.unwrap();
        repo.put("b", "2").await.unwrap();
        repo.put("c", "3").await.unwrap();

        assert!(repo.delete("a").await.unwrap());
        assert!(!repo.delete("a").await.unwrap());
        let keys: Vec<String> = repo.list().await.unwrap().into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["b", "c"]);

        assert_eq!(repo.clear().await.unwrap(), 2);
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mirror_copies_documents() {
        let repo = repo().await;
        repo.put("catalog", r#"[{"category":"Small (100g)"}]"#).await.unwrap();

        let mirror = repo.mirror().await.unwrap();
        assert_eq!(mirror.len(), 1);
        assert_eq!(
            mirror.get("catalog").unwrap(),
            Some(json!([{ "category": "Small (100g)" }]))
        );
    }
}
