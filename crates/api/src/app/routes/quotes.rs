use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};

use pricelab_core::QuoteId;
use pricelab_pricing::import;
use pricelab_pricing::{Quote, QuoteType};
use pricelab_storage::PriceStore;

use crate::app::routes::items::parse_item_id;
use crate::app::services::AppStore;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/items/:id/quotes", post(create_quote).get(list_quotes))
        .route("/items/:id/quotes/batch", post(import_quotes))
        .route(
            "/quotes/:id",
            get(get_quote).put(update_quote).delete(delete_quote),
        )
}

fn parse_quote_id(raw: &str) -> Result<QuoteId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid quote id"))
}

fn parse_quote_date(raw: &str) -> Result<NaiveDate, axum::response::Response> {
    import::parse_date(raw).ok_or_else(|| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_date",
            format!("unrecognized date: {raw}"),
        )
    })
}

fn parse_quote_type(raw: Option<&str>) -> Result<QuoteType, axum::response::Response> {
    match raw {
        None => Ok(QuoteType::default()),
        Some(s) => QuoteType::parse(s).map_err(errors::domain_error_to_response),
    }
}

pub async fn create_quote(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
    Json(body): Json<dto::CreateQuoteRequest>,
) -> axum::response::Response {
    let item_id = match parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let quote_date = match parse_quote_date(&body.quote_date) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let quote_type = match parse_quote_type(body.quote_type.as_deref()) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    let quote = match Quote::new(item_id, body.source, quote_date, body.unit_price, quote_type) {
        Ok(q) => q,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match store.create_quote(quote).await {
        Ok(q) => {
            let today = Utc::now().date_naive();
            (StatusCode::CREATED, Json(dto::QuoteView::of(q, today))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_quotes(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id = match parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.get_item(item_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "item not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    }

    match store.list_quotes(item_id).await {
        Ok(quotes) => {
            let today = Utc::now().date_naive();
            let views: Vec<_> = quotes
                .into_iter()
                .map(|q| dto::QuoteView::of(q, today))
                .collect();
            Json(views).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Pasted-text batch import; rejected whole when any line fails to parse.
pub async fn import_quotes(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ImportRequest>,
) -> axum::response::Response {
    let item_id = match parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let rows = match import::parse_quotes(&body.text) {
        Ok(r) => r,
        Err(e) => return errors::import_error_to_response(e),
    };

    let mut quotes = Vec::with_capacity(rows.len());
    for row in rows {
        let quote = match Quote::new(
            item_id,
            row.source,
            row.quote_date,
            row.unit_price,
            row.quote_type,
        ) {
            Ok(q) => q,
            Err(e) => return errors::domain_error_to_response(e),
        };
        quotes.push(quote);
    }

    match store.create_quotes(quotes).await {
        Ok(created) => {
            let today = Utc::now().date_naive();
            let views: Vec<_> = created
                .into_iter()
                .map(|q| dto::QuoteView::of(q, today))
                .collect();
            (StatusCode::CREATED, Json(views)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_quote(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_quote_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.get_quote(id).await {
        Ok(Some(q)) => Json(dto::QuoteView::of(q, Utc::now().date_naive())).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "quote not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_quote(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateQuoteRequest>,
) -> axum::response::Response {
    let id = match parse_quote_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let current = match store.get_quote(id).await {
        Ok(Some(q)) => q,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "quote not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let quote_date = match parse_quote_date(&body.quote_date) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let quote_type = match body.quote_type.as_deref() {
        None => current.quote_type,
        Some(s) => match QuoteType::parse(s) {
            Ok(t) => t,
            Err(e) => return errors::domain_error_to_response(e),
        },
    };
    let is_outlier = body.is_outlier.unwrap_or(current.is_outlier);

    let updated = match current.with_fields(
        body.source,
        quote_date,
        body.unit_price,
        quote_type,
        is_outlier,
    ) {
        Ok(q) => q,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match store.update_quote(updated).await {
        Ok(q) => Json(dto::QuoteView::of(q, Utc::now().date_naive())).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_quote(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_quote_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.delete_quote(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
