use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use partscope_core::ItemId;
use partscope_inventory::{Classification, InventoryItem, ItemPatch};

use super::{InventoryStore, StoreError};

#[derive(Debug, Clone)]
struct StoredRow {
    seq: u64,
    item: InventoryItem,
}

/// In-memory inventory store.
///
/// Intended for dev/test wiring. Not a persistence scheme.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    rows: RwLock<HashMap<ItemId, StoredRow>>,
    seq: AtomicU64,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("lock poisoned".to_string())
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn insert(&self, item: InventoryItem) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        if rows.contains_key(&item.id) {
            return Err(StoreError::Backend(format!("duplicate item id {}", item.id)));
        }
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        rows.insert(item.id, StoredRow { seq, item });
        Ok(())
    }

    async fn get(&self, id: &ItemId) -> Result<Option<InventoryItem>, StoreError> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        Ok(rows.get(id).map(|r| r.item.clone()))
    }

    async fn get_many(&self, ids: &[ItemId]) -> Result<Vec<InventoryItem>, StoreError> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        Ok(ids
            .iter()
            .filter_map(|id| rows.get(id).map(|r| r.item.clone()))
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        let mut all: Vec<&StoredRow> = rows.values().collect();
        // Newest first; the insertion sequence breaks created_at ties.
        all.sort_by(|a, b| {
            (b.item.created_at, b.seq).cmp(&(a.item.created_at, a.seq))
        });
        Ok(all.into_iter().map(|r| r.item.clone()).collect())
    }

    async fn update(&self, id: &ItemId, patch: &ItemPatch) -> Result<InventoryItem, StoreError> {
        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        let row = rows.get_mut(id).ok_or(StoreError::NotFound)?;
        patch.apply(&mut row.item);
        Ok(row.item.clone())
    }

    async fn record_classification(
        &self,
        id: &ItemId,
        outcome: Classification,
    ) -> Result<InventoryItem, StoreError> {
        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        let row = rows.get_mut(id).ok_or(StoreError::NotFound)?;
        row.item.apply_classification(outcome);
        Ok(row.item.clone())
    }

    async fn delete(&self, id: &ItemId) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        rows.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    async fn delete_many(&self, ids: &[ItemId]) -> Result<u64, StoreError> {
        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        let mut removed = 0;
        for id in ids {
            if rows.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use partscope_inventory::ItemDraft;

    fn new_item(name: &str) -> InventoryItem {
        let id = ItemId::new();
        ItemDraft {
            name: Some(name.to_string()),
            ..ItemDraft::default()
        }
        .into_item(id, format!("/inventory/images/{id}.png"), Utc::now())
        .unwrap()
    }

    #[tokio::test]
    async fn insert_then_get_round_trips_all_fields() {
        let store = InMemoryInventoryStore::new();
        let item = new_item("Gasket");
        store.insert(item.clone()).await.unwrap();

        let fetched = store.get(&item.id).await.unwrap().unwrap();
        assert_eq!(fetched, item);
    }

    #[tokio::test]
    async fn list_all_is_newest_created_first() {
        let store = InMemoryInventoryStore::new();
        let first = new_item("first");
        let second = new_item("second");
        let third = new_item("third");
        for item in [&first, &second, &third] {
            store.insert(item.clone()).await.unwrap();
        }

        let names: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn get_many_skips_missing_ids() {
        let store = InMemoryInventoryStore::new();
        let item = new_item("present");
        store.insert(item.clone()).await.unwrap();

        let found = store.get_many(&[item.id, ItemId::new()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, item.id);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = InMemoryInventoryStore::new();
        let patch = ItemPatch::from_fields(Some("x".into()), None, None, None, false).unwrap();
        let err = store.update(&ItemId::new(), &patch).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn delete_many_reports_how_many_existed() {
        let store = InMemoryInventoryStore::new();
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

    #[tokio::test]
    async fn classification_sets_score_label_and_status() {
        let store = InMemoryInventoryStore::new();
        let item = new_item("lot");
        store.insert(item.clone()).await.unwrap();

        let updated = store
            .record_classification(&item.id, Classification::new(0.91, 1))
            .await
            .unwrap();
        assert_eq!(updated.score(), Some(0.91));
        assert_eq!(updated.label(), Some(1));
        assert_eq!(updated.status, partscope_core::ItemStatus::NeedsAttention);
    }
}
