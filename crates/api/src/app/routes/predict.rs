use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Classify a standalone image without touching the inventory.
pub async fn predict(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::PredictRequest>,
) -> axum::response::Response {
    match services.predict(&body.image_base64).await {
        Ok(prediction) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "score": prediction.score,
                "label": prediction.label,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Recent prediction-log entries, newest first.
pub async fn history(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::HistoryQuery>,
) -> axum::response::Response {
    let limit = query.limit.unwrap_or(50);
    match services.prediction_history(limit).await {
        Ok(records) => (
            StatusCode::OK,
            Json(serde_json::Value::Array(
                records.iter().map(dto::prediction_to_json).collect(),
            )),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
