use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use partscope_core::DomainError;

use crate::app::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        ServiceError::Domain(DomainError::Validation(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        ServiceError::Domain(DomainError::InvalidId(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_id", msg)
        }
        ServiceError::Domain(DomainError::NotFound) | ServiceError::NotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "inventory item not found")
        }
        ServiceError::Decode(msg) => json_error(StatusCode::BAD_REQUEST, "decode_error", msg),
        ServiceError::Inference(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "inference_error", msg)
        }
        ServiceError::Store(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
        ServiceError::Images(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "image_store_error", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
