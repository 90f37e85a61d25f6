use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use pricelab_core::{ItemId, ProcessId};
use pricelab_pricing::import;
use pricelab_pricing::{Item, PricingStrategy};
use pricelab_storage::{PriceStore, StoreError};

use crate::app::routes::processes::parse_process_id;
use crate::app::services::AppStore;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/processes/:id/items", post(create_item).get(list_items))
        .route("/processes/:id/items/batch", post(import_items))
        .route("/processes/:id/items/reorder", post(reorder_items))
        .route(
            "/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
}

pub(crate) fn parse_item_id(raw: &str) -> Result<ItemId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"))
}

fn parse_strategy(raw: Option<&str>) -> Result<Option<PricingStrategy>, axum::response::Response> {
    match raw {
        None => Ok(None),
        Some(s) => PricingStrategy::parse(s)
            .map(Some)
            .map_err(errors::domain_error_to_response),
    }
}

/// Next number after the process's current maximum.
async fn next_item_number(store: &AppStore, process_id: ProcessId) -> Result<u32, StoreError> {
    let items = store.list_items(process_id).await?;
    Ok(items.iter().map(|i| i.item_number).max().unwrap_or(0) + 1)
}

pub async fn create_item(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
    Json(body): Json<dto::CreateItemRequest>,
) -> axum::response::Response {
    let process_id = match parse_process_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let strategy = match parse_strategy(body.pricing_strategy.as_deref()) {
        Ok(s) => s.unwrap_or_default(),
        Err(resp) => return resp,
    };

    let item_number = match body.item_number {
        Some(n) => n,
        None => match next_item_number(&store, process_id).await {
            Ok(n) => n,
            Err(e) => return errors::store_error_to_response(e),
        },
    };

    let item = match Item::new(
        process_id,
        item_number,
        body.specification,
        body.unit,
        body.quantity,
        strategy,
    ) {
        Ok(i) => i,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match store.create_item(item).await {
        Ok(i) => (StatusCode::CREATED, Json(i)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let process_id = match parse_process_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    // A missing process lists as empty; distinguish it explicitly.
    match store.get_process(process_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "process not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    }

    match store.list_items(process_id).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Pasted-text batch import. All rows parse and insert, or nothing does.
pub async fn import_items(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ImportRequest>,
) -> axum::response::Response {
    let process_id = match parse_process_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let rows = match import::parse_items(&body.text) {
        Ok(r) => r,
        Err(e) => return errors::import_error_to_response(e),
    };

    let mut next = match next_item_number(&store, process_id).await {
        Ok(n) => n,
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let number = match row.item_number {
            Some(n) => {
                next = next.max(n + 1);
                n
            }
            None => {
                let n = next;
                next += 1;
                n
            }
        };

        let item = match Item::new(
            process_id,
            number,
            row.specification,
            row.unit,
            row.quantity,
            PricingStrategy::default(),
        ) {
            Ok(i) => i,
            Err(e) => return errors::domain_error_to_response(e),
        };
        items.push(item);
    }

    match store.create_items(items).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn reorder_items(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReorderRequest>,
) -> axum::response::Response {
    let process_id = match parse_process_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut ordered = Vec::with_capacity(body.item_ids.len());
    for raw in &body.item_ids {
        match parse_item_id(raw) {
            Ok(v) => ordered.push(v),
            Err(resp) => return resp,
        }
    }

    match store.reorder_items(process_id, ordered).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.get_item(id).await {
        Ok(Some(i)) => Json(i).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "item not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateItemRequest>,
) -> axum::response::Response {
    let id = match parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let current = match store.get_item(id).await {
        Ok(Some(i)) => i,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "item not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let strategy = match parse_strategy(body.pricing_strategy.as_deref()) {
        Ok(s) => s.unwrap_or(current.pricing_strategy),
        Err(resp) => return resp,
    };

    let updated = match current.with_fields(
        body.item_number,
        body.specification,
        body.unit,
        body.quantity,
        strategy,
    ) {
        Ok(i) => i,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match store.update_item(updated).await {
        Ok(i) => Json(i).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.delete_item(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
