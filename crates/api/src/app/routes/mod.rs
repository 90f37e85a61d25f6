use axum::{Router, routing::get};

pub mod history;
pub mod items;
pub mod processes;
pub mod quotes;
pub mod report;
pub mod system;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .merge(processes::router())
        .merge(items::router())
        .merge(quotes::router())
        .merge(report::router())
        .route("/history", get(history::list_history))
}
