use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use partscope_core::ItemId;
use partscope_inventory::ItemPatch;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_inventory))
        .route("/upload", post(upload_inventory))
        .route("/classify", post(classify_inventory))
        .route("/batch-update", post(batch_update_inventory))
        .route("/batch-delete", post(batch_delete_inventory))
        .route("/ai-insights", post(ai_insights))
        .route(
            "/:id",
            get(get_inventory_item)
                .patch(update_inventory_item)
                .delete(delete_inventory_item),
        )
}

pub async fn list_inventory(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.list_items().await {
        Ok(items) => (StatusCode::OK, Json(dto::items_to_json(&items))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_inventory_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };

    match services.get_item(&id).await {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn upload_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::UploadRequest>,
) -> axum::response::Response {
    match services.upload(body.items).await {
        Ok(items) => (StatusCode::OK, Json(dto::items_to_json(&items))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn classify_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    body: Option<Json<dto::ClassifyRequest>>,
) -> axum::response::Response {
    // Ids that are not well-formed cannot name a record; skip them like
    // any other unknown id.
    let ids = body
        .and_then(|Json(req)| req.item_ids)
        .map(|ids| ids.iter().filter_map(|raw| raw.parse().ok()).collect());

    match services.classify(ids).await {
        Ok(items) => (StatusCode::OK, Json(dto::items_to_json(&items))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_inventory_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateItemRequest>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };

    let patch = match ItemPatch::from_fields(
        body.name,
        body.status,
        body.owner,
        body.notes,
        body.append_notes,
    ) {
        Ok(p) => p,
        Err(e) => return errors::service_error_to_response(e.into()),
    };

    match services.update_item(&id, &patch).await {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn batch_update_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::BatchUpdateRequest>,
) -> axum::response::Response {
    let patch = match ItemPatch::from_fields(
        body.name,
        body.status,
        body.owner,
        body.notes,
        body.append_notes,
    ) {
        Ok(p) => p,
        Err(e) => return errors::service_error_to_response(e.into()),
    };

    let ids: Vec<ItemId> = body
        .item_ids
        .iter()
        .filter_map(|raw| raw.parse().ok())
        .collect();

    match services.batch_update(&ids, &patch).await {
        Ok(items) => (StatusCode::OK, Json(dto::items_to_json(&items))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_inventory_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };

    match services.delete_item(&id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "deleted": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn batch_delete_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ItemIdsRequest>,
) -> axum::response::Response {
    let ids: Vec<ItemId> = body
        .item_ids
        .iter()
        .filter_map(|raw| raw.parse().ok())
        .collect();

    match services.batch_delete(&ids).await {
        Ok(removed) => (
            StatusCode::OK,
            Json(serde_json::json!({ "removed": removed })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn ai_insights(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ItemIdsRequest>,
) -> axum::response::Response {
    match services.insights(&body.item_ids).await {
        Ok((insights, missing)) => (
            StatusCode::OK,
            Json(dto::insights_to_json(&insights, &missing)),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
