//! Persistent collection of inventory records, keyed by identifier.

use async_trait::async_trait;
use thiserror::Error;

use partscope_core::ItemId;
use partscope_inventory::{Classification, InventoryItem, ItemPatch};

mod in_memory;
mod sqlite;

pub use in_memory::InMemoryInventoryStore;
pub use sqlite::SqliteInventoryStore;

/// Storage-level error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The id is not present in the store.
    #[error("record not found")]
    NotFound,

    /// Anything the backend itself failed at.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Store contract for inventory records.
///
/// Single-record updates are atomic with respect to concurrent updates to
/// the same id (last writer wins); no cross-record transactions.
#[async_trait]
pub trait InventoryStore: Send + Sync + 'static {
    /// Insert a new record under its unique id.
    async fn insert(&self, item: InventoryItem) -> Result<(), StoreError>;

    async fn get(&self, id: &ItemId) -> Result<Option<InventoryItem>, StoreError>;

    /// Fetch the records for the given ids; missing ids are simply absent
    /// from the result. Order unspecified.
    async fn get_many(&self, ids: &[ItemId]) -> Result<Vec<InventoryItem>, StoreError>;

    /// All records, newest-created-first.
    async fn list_all(&self) -> Result<Vec<InventoryItem>, StoreError>;

    /// Apply a patch to one record as a single read-modify-write.
    ///
    /// A patch with no effective fields is a no-op, not an error.
    async fn update(&self, id: &ItemId, patch: &ItemPatch) -> Result<InventoryItem, StoreError>;

    /// Store a model verdict, deriving the record's status from the label.
    async fn record_classification(
        &self,
        id: &ItemId,
        outcome: Classification,
    ) -> Result<InventoryItem, StoreError>;

    /// Permanently remove one record.
    async fn delete(&self, id: &ItemId) -> Result<(), StoreError>;

    /// Permanently remove a set of records; returns how many existed.
    async fn delete_many(&self, ids: &[ItemId]) -> Result<u64, StoreError>;
}
