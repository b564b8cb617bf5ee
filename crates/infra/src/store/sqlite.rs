//! SQLite-backed inventory store (sqlx).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;

use partscope_core::{ItemId, ItemStatus};
use partscope_inventory::{Classification, InventoryItem, ItemPatch};

use super::{InventoryStore, StoreError};

const CREATE_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS inventory_items (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'awaiting_review',
    owner TEXT NOT NULL DEFAULT '',
    created_at_micros INTEGER NOT NULL,
    image_path TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT '',
    score REAL,
    label INTEGER
)
"#;

const ITEM_COLUMNS: &str = "id, name, status, owner, created_at_micros, image_path, notes, score, label";

/// Persistent inventory store on SQLite.
///
/// Queries are built at runtime with positional binds and mapped by hand;
/// per-record updates run inside a transaction, which SQLite serializes
/// against concurrent writers.
pub struct SqliteInventoryStore {
    pool: SqlitePool,
}

impl SqliteInventoryStore {
    /// Open (and create if missing) the database file at `path`.
    pub async fn connect_file(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::connect_with(options).await
    }

    /// Fresh in-memory database; used by tests.
    pub async fn connect_in_memory() -> Result<Self, StoreError> {
        Self::connect_with(SqliteConnectOptions::new().in_memory(true)).await
    }

    async fn connect_with(options: SqliteConnectOptions) -> Result<Self, StoreError> {
        // One connection: SQLite serializes writers anyway, and a single
        // handle keeps an in-memory database alive across calls.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::query(CREATE_ITEMS_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Shared handle for other adapters on the same database.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    fn row_to_item(row: &SqliteRow) -> Result<InventoryItem, StoreError> {
        let id: String = row.try_get("id")?;
        let id: ItemId = id
            .parse()
            .map_err(|e| StoreError::Backend(format!("stored id: {e}")))?;

        let status: String = row.try_get("status")?;
        let status: ItemStatus = status
            .parse()
            .map_err(|e| StoreError::Backend(format!("stored status: {e}")))?;

        let micros: i64 = row.try_get("created_at_micros")?;
        let created_at = DateTime::<Utc>::from_timestamp_micros(micros)
            .ok_or_else(|| StoreError::Backend(format!("stored timestamp {micros} out of range")))?;

        let score: Option<f64> = row.try_get("score")?;
        let label: Option<i64> = row.try_get("label")?;
        let classification = match (score, label) {
            (Some(score), Some(label)) => Some(Classification::new(score, label as u8)),
            _ => None,
        };

        Ok(InventoryItem {
            id,
            name: row.try_get("name")?,
            status,
            owner: row.try_get("owner")?,
            created_at,
            image_path: row.try_get("image_path")?,
            notes: row.try_get("notes")?,
            classification,
        })
    }
}

#[async_trait]
impl InventoryStore for SqliteInventoryStore {
    async fn insert(&self, item: InventoryItem) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO inventory_items \
             (id, name, status, owner, created_at_micros, image_path, notes, score, label) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(item.id.to_string())
        .bind(&item.name)
        .bind(item.status.as_str())
        .bind(&item.owner)
        .bind(item.created_at.timestamp_micros())
        .bind(&item.image_path)
        .bind(&item.notes)
        .bind(item.score())
        .bind(item.label().map(i64::from))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: &ItemId) -> Result<Option<InventoryItem>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    async fn get_many(&self, ids: &[ItemId]) -> Result<Vec<InventoryItem>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_item).collect()
    }

    async fn list_all(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items \
             ORDER BY created_at_micros DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }

    async fn update(&self, id: &ItemId, patch: &ItemPatch) -> Result<InventoryItem, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        let mut item = Self::row_to_item(&row)?;
        patch.apply(&mut item);

        sqlx::query(
            "UPDATE inventory_items SET name = ?, status = ?, owner = ?, notes = ? WHERE id = ?",
        )
        .bind(&item.name)
        .bind(item.status.as_str())
        .bind(&item.owner)
        .bind(&item.notes)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(item)
    }

    async fn record_classification(
        &self,
        id: &ItemId,
        outcome: Classification,
    ) -> Result<InventoryItem, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        let mut item = Self::row_to_item(&row)?;
        item.apply_classification(outcome);

        sqlx::query("UPDATE inventory_items SET status = ?, score = ?, label = ? WHERE id = ?")
            .bind(item.status.as_str())
            .bind(item.score())
            .bind(item.label().map(i64::from))
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(item)
    }

    async fn delete(&self, id: &ItemId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_many(&self, ids: &[ItemId]) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!("DELETE FROM inventory_items WHERE id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partscope_inventory::ItemDraft;

    fn new_item(name: &str) -> InventoryItem {
        let id = ItemId::new();
        ItemDraft {
            name: Some(name.to_string()),
            owner: Some("Dana".to_string()),
            notes: Some("as received".to_string()),
            ..ItemDraft::default()
        }
        .into_item(id, format!("/inventory/images/{id}.png"), Utc::now())
        .unwrap()
    }

    #[tokio::test]
    async fn insert_then_get_round_trips_all_fields() {
        let store = SqliteInventoryStore::connect_in_memory().await.unwrap();
        let item = new_item("Gasket");
        store.insert(item.clone()).await.unwrap();

        let fetched = store.get(&item.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, item.id);
        assert_eq!(fetched.name, item.name);
        assert_eq!(fetched.status, item.status);
        assert_eq!(fetched.owner, item.owner);
        assert_eq!(fetched.image_path, item.image_path);
        assert_eq!(fetched.notes, item.notes);
        assert_eq!(fetched.classification, None);
        assert_eq!(
            fetched.created_at.timestamp_micros(),
            item.created_at.timestamp_micros()
        );
    }

    #[tokio::test]
    async fn update_applies_patch_and_persists() {
        let store = SqliteInventoryStore::connect_in_memory().await.unwrap();
        let item = new_item("Gasket");
        store.insert(item.clone()).await.unwrap();

        let patch = ItemPatch::from_fields(
            None,
            Some("in_review".to_string()),
            Some("  Priya ".to_string()),
            Some("second look".to_string()),
            true,
        )
        .unwrap();
        let updated = store.update(&item.id, &patch).await.unwrap();
        assert_eq!(updated.status, ItemStatus::InReview);
        assert_eq!(updated.owner, "Priya");
        assert_eq!(updated.notes, "as received\nsecond look");

        let fetched = store.get(&item.id).await.unwrap().unwrap();
        assert_eq!(fetched.notes, "as received\nsecond look");
    }

    #[tokio::test]
    async fn classification_persists_score_label_and_status() {
        let store = SqliteInventoryStore::connect_in_memory().await.unwrap();
        let item = new_item("lot");
        store.insert(item.clone()).await.unwrap();

        store
            .record_classification(&item.id, Classification::new(0.2, 0))
            .await
            .unwrap();

        let fetched = store.get(&item.id).await.unwrap().unwrap();
        assert_eq!(fetched.score(), Some(0.2));
        assert_eq!(fetched.label(), Some(0));
        assert_eq!(fetched.status, ItemStatus::Cleared);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let store = SqliteInventoryStore::connect_in_memory().await.unwrap();
        let err = store.delete(&ItemId::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn delete_many_counts_only_existing_rows() {
        let store = SqliteInventoryStore::connect_in_memory().await.unwrap();
        let a = new_item("a");
        let b = new_item("b");
        store.insert(a.clone()).await.unwrap();
        store.insert(b.clone()).await.unwrap();

        let removed = store
            .delete_many(&[a.id, b.id, ItemId::new()])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
