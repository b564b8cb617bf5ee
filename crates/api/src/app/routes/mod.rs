use axum::routing::{get, post};
use axum::Router;

pub mod inventory;
pub mod predict;
pub mod system;

/// Router for the whole API surface.
pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(system::health))
        .route("/api/predict", post(predict::predict))
        .route("/api/predictions", get(predict::history))
        .nest("/api/inventory", inventory::router())
}
