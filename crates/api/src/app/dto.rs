use serde::Deserialize;

use partscope_ai::Insight;
use partscope_infra::PredictionRecord;
use partscope_inventory::{InventoryItem, ItemDraft};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub image_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadEntry {
    #[serde(default)]
    pub image_base64: String,
    #[serde(flatten)]
    pub draft: ItemDraft,
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub items: Vec<UploadEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClassifyRequest {
    /// Absent means "classify everything".
    #[serde(default)]
    pub item_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub owner: Option<String>,
    #[serde(default)]
    pub append_notes: bool,
}

#[derive(Debug, Deserialize)]
pub struct BatchUpdateRequest {
    pub item_ids: Vec<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub owner: Option<String>,
    #[serde(default)]
    pub append_notes: bool,
}

#[derive(Debug, Deserialize)]
pub struct ItemIdsRequest {
    pub item_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

/// Flat field-value row, the only record shape callers ever see.
pub fn item_to_json(item: &InventoryItem) -> serde_json::Value {
    serde_json::json!({
        "id": item.id.to_string(),
        "name": item.name,
        "status": item.status.as_str(),
        "owner": item.owner,
        "created_at": seconds_since_epoch(item),
        "image_path": item.image_path,
        "notes": item.notes,
        "score": item.score(),
        "label": item.label(),
    })
}

pub fn items_to_json(items: &[InventoryItem]) -> serde_json::Value {
    serde_json::Value::Array(items.iter().map(item_to_json).collect())
}

pub fn insights_to_json(insights: &[Insight], missing: &[String]) -> serde_json::Value {
    serde_json::json!({
        "insights": insights,
        "missing": missing,
    })
}

pub fn prediction_to_json(record: &PredictionRecord) -> serde_json::Value {
    serde_json::json!({
        "score": record.score,
        "label": record.label,
        "created_at": record.created_at.timestamp_micros() as f64 / 1_000_000.0,
    })
}

fn seconds_since_epoch(item: &InventoryItem) -> f64 {
    item.created_at.timestamp_micros() as f64 / 1_000_000.0
}
