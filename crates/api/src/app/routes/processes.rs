use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use pricelab_core::ProcessId;
use pricelab_pricing::Process;
use pricelab_storage::PriceStore;

use crate::app::services::AppStore;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/processes", post(create_process).get(list_processes))
        .route(
            "/processes/:id",
            get(get_process).put(update_process).delete(delete_process),
        )
}

pub(crate) fn parse_process_id(raw: &str) -> Result<ProcessId, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid process id")
    })
}

pub async fn create_process(
    Extension(store): Extension<Arc<AppStore>>,
    Json(body): Json<dto::CreateProcessRequest>,
) -> axum::response::Response {
    let process = match Process::new(body.process_number, body.object) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match store.create_process(process).await {
        Ok(p) => (StatusCode::CREATED, Json(p)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_processes(
    Extension(store): Extension<Arc<AppStore>>,
) -> axum::response::Response {
    match store.list_processes().await {
        Ok(processes) => Json(processes).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_process(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_process_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.get_process(id).await {
        Ok(Some(p)) => Json(p).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "process not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_process(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateProcessRequest>,
) -> axum::response::Response {
    let id = match parse_process_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let current = match store.get_process(id).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "process not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let updated = match current.with_fields(body.process_number, body.object) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match store.update_process(updated).await {
        Ok(p) => Json(p).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_process(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_process_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.delete_process(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
