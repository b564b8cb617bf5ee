//! The inventory lifecycle service.
//!
//! `AppServices` orchestrates upload, classification, updates and insights
//! over four injected capabilities: the record store, the image content
//! directory, the defect classifier and the auxiliary prediction log. All
//! of them are trait objects so tests can substitute stubs.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use partscope_ai::{build_insight, Insight, ItemSnapshot};
use partscope_core::{DomainError, ItemId};
use partscope_infra::{
    DirImageStore, ImageStore, ImageStoreError, InMemoryInventoryStore, InMemoryPredictionLog,
    InventoryStore, PredictionLog, PredictionRecord, SqliteInventoryStore, SqlitePredictionLog,
    StoreError,
};
use partscope_inventory::{Classification, InventoryItem, ItemPatch};
use partscope_vision::{ConvNextClassifier, DefectClassifier, Prediction, VisionError};

use crate::app::dto;

/// Failure of a lifecycle operation, mapped onto HTTP in `errors.rs`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("not found")]
    NotFound,

    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("storage error: {0}")]
    Store(String),

    #[error("image storage error: {0}")]
    Images(String),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServiceError::NotFound,
            other => ServiceError::Store(other.to_string()),
        }
    }
}

impl From<ImageStoreError> for ServiceError {
    fn from(e: ImageStoreError) -> Self {
        ServiceError::Images(e.to_string())
    }
}

/// Environment-derived wiring choices (see `main.rs`).
pub struct ServicesConfig {
    pub model_path: PathBuf,
    pub data_dir: PathBuf,
    /// SQLite database file; `None` selects the in-memory store.
    pub database: Option<PathBuf>,
}

/// Assemble production services.
///
/// Loads the model checkpoint once; a missing or broken checkpoint aborts
/// startup.
pub async fn build_services(config: &ServicesConfig) -> anyhow::Result<AppServices> {
    let classifier: Arc<dyn DefectClassifier> =
        Arc::new(ConvNextClassifier::load(&config.model_path)?);
    let images: Arc<dyn ImageStore> = Arc::new(DirImageStore::new(config.data_dir.join("images"))?);

    match &config.database {
        Some(path) => {
            let store = SqliteInventoryStore::connect_file(path).await?;
            let predictions: Arc<dyn PredictionLog> =
                Arc::new(SqlitePredictionLog::new(store.pool()).await?);
            info!(database = %path.display(), "using sqlite inventory store");
            Ok(AppServices::new(
                Arc::new(store),
                images,
                classifier,
                predictions,
            ))
        }
        None => Ok(AppServices::new(
            Arc::new(InMemoryInventoryStore::new()),
            images,
            classifier,
            Arc::new(InMemoryPredictionLog::new()),
        )),
    }
}

pub struct AppServices {
    store: Arc<dyn InventoryStore>,
    images: Arc<dyn ImageStore>,
    classifier: Arc<dyn DefectClassifier>,
    predictions: Arc<dyn PredictionLog>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        images: Arc<dyn ImageStore>,
        classifier: Arc<dyn DefectClassifier>,
        predictions: Arc<dyn PredictionLog>,
    ) -> Self {
        Self {
            store,
            images,
            classifier,
            predictions,
        }
    }

    /// Classify a standalone image without creating a record.
    pub async fn predict(&self, image_base64: &str) -> Result<Prediction, ServiceError> {
        let bytes = decode_base64_field(image_base64, "image_base64")?;
        let prediction = self.run_classifier(bytes).await?;
        self.log_prediction(prediction).await;
        Ok(prediction)
    }

    /// Store a batch of images as new inventory records.
    ///
    /// All-or-nothing on validation: every entry is decoded and its status
    /// checked before anything is written, so a bad entry anywhere in the
    /// batch leaves the store untouched.
    pub async fn upload(
        &self,
        entries: Vec<dto::UploadEntry>,
    ) -> Result<Vec<InventoryItem>, ServiceError> {
        let mut prepared = Vec::with_capacity(entries.len());
        for entry in entries {
            let bytes = decode_base64_field(&entry.image_base64, "image_base64")?;
            let id = ItemId::new();
            let item = entry
                .draft
                .into_item(id, format!("/inventory/images/{id}.png"), Utc::now())?;
            prepared.push((item, bytes));
        }

        for (item, bytes) in prepared {
            let filename = image_filename(&item.image_path).to_string();
            self.images.put(&filename, &bytes).await?;
            self.store.insert(item).await?;
        }

        Ok(self.store.list_all().await?)
    }

    /// Classify every stored record, or the given subset.
    ///
    /// Per-item failures (missing image, inference error) annotate the
    /// record with a diagnostic note and never abort the rest of the
    /// batch.
    pub async fn classify(
        &self,
        ids: Option<Vec<ItemId>>,
    ) -> Result<Vec<InventoryItem>, ServiceError> {
        let targets = match ids {
            Some(ids) => self.store.get_many(&ids).await?,
            None => self.store.list_all().await?,
        };

        for item in targets {
            let filename = image_filename(&item.image_path).to_string();
            let bytes = match self.images.get(&filename).await {
                Ok(bytes) => bytes,
                Err(ImageStoreError::NotFound(_)) => {
                    warn!(item_id = %item.id, "stored image missing; item left unclassified");
                    self.annotate(&item.id, format!("Missing image: {filename}"))
                        .await;
                    continue;
                }
                Err(e) => {
                    self.annotate(&item.id, format!("Classification failed: {e}"))
                        .await;
                    continue;
                }
            };

            match self.run_classifier(bytes).await {
                Ok(prediction) => {
                    let outcome =
                        Classification::new(f64::from(prediction.score), prediction.label);
                    if let Err(e) = self.store.record_classification(&item.id, outcome).await {
                        warn!(item_id = %item.id, "could not persist classification: {e}");
                        continue;
                    }
                    self.log_prediction(prediction).await;
                }
                Err(e) => {
                    warn!(item_id = %item.id, "classification failed: {e}");
                    self.annotate(&item.id, format!("Classification failed: {e}"))
                        .await;
                }
            }
        }

        Ok(self.store.list_all().await?)
    }

    pub async fn list_items(&self) -> Result<Vec<InventoryItem>, ServiceError> {
        Ok(self.store.list_all().await?)
    }

    pub async fn get_item(&self, id: &ItemId) -> Result<InventoryItem, ServiceError> {
        self.store.get(id).await?.ok_or(ServiceError::NotFound)
    }

    pub async fn update_item(
        &self,
        id: &ItemId,
        patch: &ItemPatch,
    ) -> Result<InventoryItem, ServiceError> {
        Ok(self.store.update(id, patch).await?)
    }

    /// Apply one patch to every existing id; ids not found are skipped.
    pub async fn batch_update(
        &self,
        ids: &[ItemId],
        patch: &ItemPatch,
    ) -> Result<Vec<InventoryItem>, ServiceError> {
        let mut touched = 0usize;
        for id in ids {
            match self.store.update(id, patch).await {
                Ok(_) => touched += 1,
                Err(StoreError::NotFound) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if touched == 0 {
            return Err(ServiceError::NotFound);
        }
        Ok(self.store.list_all().await?)
    }

    pub async fn delete_item(&self, id: &ItemId) -> Result<(), ServiceError> {
        Ok(self.store.delete(id).await?)
    }

    pub async fn batch_delete(&self, ids: &[ItemId]) -> Result<u64, ServiceError> {
        Ok(self.store.delete_many(ids).await?)
    }

    /// Compute insights for the requested ids.
    ///
    /// Ids are deduplicated keeping first-occurrence order; ids that do
    /// not resolve to a record (unknown, or not a well-formed id at all)
    /// are reported in the second list, not as errors.
    pub async fn insights(
        &self,
        raw_ids: &[String],
    ) -> Result<(Vec<Insight>, Vec<String>), ServiceError> {
        let mut seen = HashSet::new();
        let mut insights = Vec::new();
        let mut missing = Vec::new();

        for raw in raw_ids {
            if !seen.insert(raw.clone()) {
                continue;
            }
            let item = match raw.parse::<ItemId>() {
                Ok(id) => self.store.get(&id).await?,
                Err(_) => None,
            };
            match item {
                Some(item) => insights.push(build_insight(&snapshot_of(&item))),
                None => missing.push(raw.clone()),
            }
        }

        Ok((insights, missing))
    }

    pub async fn prediction_history(
        &self,
        limit: u32,
    ) -> Result<Vec<PredictionRecord>, ServiceError> {
        Ok(self.predictions.recent(limit).await?)
    }

    /// Run the classifier off the async runtime's worker threads.
    async fn run_classifier(&self, bytes: Vec<u8>) -> Result<Prediction, ServiceError> {
        let classifier = self.classifier.clone();
        let outcome = tokio::task::spawn_blocking(move || classifier.classify(&bytes))
            .await
            .map_err(|e| ServiceError::Inference(e.to_string()))?;

        outcome.map_err(|e| match e {
            VisionError::Decode(err) => ServiceError::Decode(err.to_string()),
            other => ServiceError::Inference(other.to_string()),
        })
    }

    /// Best-effort diagnostic note on a record.
    async fn annotate(&self, id: &ItemId, text: String) {
        if let Err(e) = self.store.update(id, &ItemPatch::appended_note(text)).await {
            warn!(item_id = %id, "could not annotate item: {e}");
        }
    }

    /// Best-effort append to the auxiliary prediction log.
    async fn log_prediction(&self, prediction: Prediction) {
        if let Err(e) = self
            .predictions
            .append(f64::from(prediction.score), prediction.label)
            .await
        {
            warn!("prediction log append failed: {e}");
        }
    }
}

fn snapshot_of(item: &InventoryItem) -> ItemSnapshot {
    ItemSnapshot {
        item_id: item.id.to_string(),
        name: item.name.clone(),
        status: item.status,
        owner: item.owner.clone(),
        score: item.score(),
    }
}

/// Final path segment of a stored image reference.
fn image_filename(image_path: &str) -> &str {
    image_path.rsplit('/').next().unwrap_or(image_path)
}

fn decode_base64_field(encoded: &str, field: &str) -> Result<Vec<u8>, ServiceError> {
    let trimmed = encoded.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!(
            "{field} must not be empty"
        )));
    }
    BASE64.decode(trimmed).map_err(|_| {
        ServiceError::Validation(format!("{field} must be valid base64-encoded data"))
    })
}
