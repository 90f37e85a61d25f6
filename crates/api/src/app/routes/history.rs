use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};
use chrono::Utc;

use pricelab_storage::PriceStore;

use crate::app::services::AppStore;
use crate::app::{dto, errors};

/// Every quote across every process, newest first, with item and process
/// context for price research on past purchases.
pub async fn list_history(
    Extension(store): Extension<Arc<AppStore>>,
) -> axum::response::Response {
    match store.history().await {
        Ok(entries) => {
            let today = Utc::now().date_naive();
            let views: Vec<_> = entries
                .into_iter()
                .map(|e| dto::HistoryView::of(e, today))
                .collect();
            Json(views).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
