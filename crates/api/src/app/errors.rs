use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pricelab_core::DomainError;
use pricelab_pricing::import::ImportError;
use pricelab_storage::StoreError;

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

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::InvalidReorder(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_reorder", msg)
        }
        other => {
            tracing::error!(error = %other, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", other.to_string())
        }
    }
}

/// Failed import rows go back to the caller with their 1-based line numbers.
pub fn import_error_to_response(err: ImportError) -> axum::response::Response {
    match err {
        ImportError::Empty => json_error(StatusCode::BAD_REQUEST, "empty_import", "no rows to import"),
        ImportError::Rows(rows) => {
            let detail: Vec<_> = rows
                .iter()
                .map(|r| json!({"line": r.line, "reason": r.reason}))
                .collect();
            (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({
                    "error": "import_error",
                    "message": format!("{} row(s) failed to parse", rows.len()),
                    "rows": detail,
                })),
            )
                .into_response()
        }
    }
}
