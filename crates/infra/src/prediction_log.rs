//! Auxiliary prediction record-keeping.
//!
//! Separate from inventory: classification never depends on an append
//! succeeding. Callers log a warning and move on if it fails.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Mutex;

use crate::store::StoreError;

const CREATE_LOG_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS predictions_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    score REAL NOT NULL,
    label INTEGER NOT NULL,
    created_at_micros INTEGER NOT NULL
)
"#;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionRecord {
    pub score: f64,
    pub label: u8,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait PredictionLog: Send + Sync + 'static {
    async fn append(&self, score: f64, label: u8) -> Result<(), StoreError>;

    /// Most recent entries first.
    async fn recent(&self, limit: u32) -> Result<Vec<PredictionRecord>, StoreError>;
}

/// In-memory log for dev/test.
#[derive(Debug, Default)]
pub struct InMemoryPredictionLog {
    inner: Mutex<Vec<PredictionRecord>>,
}

impl InMemoryPredictionLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PredictionLog for InMemoryPredictionLog {
    async fn append(&self, score: f64, label: u8) -> Result<(), StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?
            .push(PredictionRecord {
                score,
                label,
                created_at: Utc::now(),
            });
        Ok(())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<PredictionRecord>, StoreError> {
        let all = self
            .inner
            .lock()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(all.iter().rev().take(limit as usize).copied().collect())
    }
}

/// SQLite-backed log, usually sharing the inventory store's pool.
pub struct SqlitePredictionLog {
    pool: SqlitePool,
}

impl SqlitePredictionLog {
    pub async fn new(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_LOG_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl PredictionLog for SqlitePredictionLog {
    async fn append(&self, score: f64, label: u8) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO predictions_log (score, label, created_at_micros) VALUES (?, ?, ?)",
        )
        .bind(score)
        .bind(i64::from(label))
        .bind(Utc::now().timestamp_micros())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<PredictionRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT score, label, created_at_micros FROM predictions_log \
             ORDER BY id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let micros: i64 = row.try_get("created_at_micros")?;
                let created_at = DateTime::<Utc>::from_timestamp_micros(micros).ok_or_else(
                    || StoreError::Backend(format!("stored timestamp {micros} out of range")),
                )?;
                let label: i64 = row.try_get("label")?;
                Ok(PredictionRecord {
                    score: row.try_get("score")?,
                    label: label as u8,
                    created_at,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteInventoryStore;

    #[tokio::test]
    async fn in_memory_log_returns_newest_first() {
        let log = InMemoryPredictionLog::new();
        log.append(0.1, 0).await.unwrap();
        log.append(0.9, 1).await.unwrap();

        let recent = log.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].score, 0.9);
        assert_eq!(recent[1].score, 0.1);
    }

    #[tokio::test]
    async fn sqlite_log_round_trips_and_limits() {
        let store = SqliteInventoryStore::connect_in_memory().await.unwrap();
        let log = SqlitePredictionLog::new(store.pool()).await.unwrap();

        log.append(0.25, 0).await.unwrap();
        log.append(0.75, 1).await.unwrap();
        log.append(0.95, 1).await.unwrap();

        let recent = log.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].score, 0.95);
        assert_eq!(recent[0].label, 1);
        assert_eq!(recent[1].score, 0.75);
    }
}
