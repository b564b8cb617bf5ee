//! `partscope-infra`: storage adapters behind the domain's seams.
//!
//! Everything here implements a trait the rest of the system depends on:
//! the inventory store (in-memory for dev/test, SQLite for persistence),
//! the image content directory, and the auxiliary prediction log.

pub mod images;
pub mod prediction_log;
pub mod store;

pub use images::{DirImageStore, ImageStore, ImageStoreError};
pub use prediction_log::{
    InMemoryPredictionLog, PredictionLog, PredictionRecord, SqlitePredictionLog,
};
pub use store::{InMemoryInventoryStore, InventoryStore, SqliteInventoryStore, StoreError};
