use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Liveness check for load balancers and monitors.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
