//! HTTP API application wiring (Axum router + store wiring).
//!
//! Layout:
//! - `services.rs`: storage backend selection and dispatch
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppStore;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(store: AppStore) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::router())
        .layer(Extension(Arc::new(store)))
}
