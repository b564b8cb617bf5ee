//! HTTP API application wiring (Axum router + service wiring).
//!
//! This folder is structured as:
//! - `services.rs`: the inventory lifecycle service and its wiring
//!   (store/image/classifier/prediction-log capabilities)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON row mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{build_services, AppServices, ServicesConfig};

/// Build the full HTTP router around an assembled service set (public
/// entrypoint used by `main.rs` and the black-box tests).
pub fn build_app(services: Arc<AppServices>) -> Router {
    routes::router()
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}
