//! Storage wiring: backend selection at startup and request-time dispatch.

use std::sync::Arc;

use pricelab_core::{ItemId, ProcessId, QuoteId};
use pricelab_pricing::{Item, Process, Quote};
use pricelab_storage::{HistoryEntry, JsonFileStore, PriceStore, SqliteStore, StoreError};

/// The configured storage backend, picked once in `main`.
///
/// Enum dispatch keeps `PriceStore` free to use `async fn` (no trait
/// objects); handlers only ever see this type.
#[derive(Debug, Clone)]
pub enum AppStore {
    Json(Arc<JsonFileStore>),
    Sqlite(Arc<SqliteStore>),
}

/// Select and open the backend from the environment.
///
/// `PRICELAB_STORE=sqlite` uses `DATABASE_URL` (default `sqlite://pricelab.db`);
/// anything else uses a JSON file at `PRICELAB_DATA_FILE` (default
/// `pricelab-data.json`).
pub async fn build_store() -> anyhow::Result<AppStore> {
    let backend = std::env::var("PRICELAB_STORE").unwrap_or_else(|_| "json".to_string());

    match backend.to_lowercase().as_str() {
        "sqlite" => {
            let url = std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://pricelab.db".to_string());
            tracing::info!(backend = "sqlite", %url, "opening store");
            Ok(AppStore::Sqlite(Arc::new(SqliteStore::connect(&url).await?)))
        }
        _ => {
            let path = std::env::var("PRICELAB_DATA_FILE")
                .unwrap_or_else(|_| "pricelab-data.json".to_string());
            tracing::info!(backend = "json", %path, "opening store");
            Ok(AppStore::Json(Arc::new(JsonFileStore::open(path)?)))
        }
    }
}

macro_rules! delegate {
    ($self:expr, $s:ident => $call:expr) => {
        match $self {
            AppStore::Json($s) => $call.await,
            AppStore::Sqlite($s) => $call.await,
        }
    };
}

impl PriceStore for AppStore {
    async fn create_process(&self, process: Process) -> Result<Process, StoreError> {
        delegate!(self, s => s.create_process(process))
    }

    async fn list_processes(&self) -> Result<Vec<Process>, StoreError> {
        delegate!(self, s => s.list_processes())
    }

    async fn get_process(&self, id: ProcessId) -> Result<Option<Process>, StoreError> {
        delegate!(self, s => s.get_process(id))
    }

    async fn update_process(&self, process: Process) -> Result<Process, StoreError> {
        delegate!(self, s => s.update_process(process))
    }

    async fn delete_process(&self, id: ProcessId) -> Result<(), StoreError> {
        delegate!(self, s => s.delete_process(id))
    }

    async fn create_item(&self, item: Item) -> Result<Item, StoreError> {
        delegate!(self, s => s.create_item(item))
    }

    async fn create_items(&self, items: Vec<Item>) -> Result<Vec<Item>, StoreError> {
        delegate!(self, s => s.create_items(items))
    }

    async fn list_items(&self, process_id: ProcessId) -> Result<Vec<Item>, StoreError> {
        delegate!(self, s => s.list_items(process_id))
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        delegate!(self, s => s.get_item(id))
    }

    async fn update_item(&self, item: Item) -> Result<Item, StoreError> {
        delegate!(self, s => s.update_item(item))
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        delegate!(self, s => s.delete_item(id))
    }

    async fn reorder_items(
        &self,
        process_id: ProcessId,
        ordered: Vec<ItemId>,
    ) -> Result<(), StoreError> {
        delegate!(self, s => s.reorder_items(process_id, ordered))
    }

    async fn create_quote(&self, quote: Quote) -> Result<Quote, StoreError> {
        delegate!(self, s => s.create_quote(quote))
    }

    async fn create_quotes(&self, quotes: Vec<Quote>) -> Result<Vec<Quote>, StoreError> {
        delegate!(self, s => s.create_quotes(quotes))
    }

    async fn list_quotes(&self, item_id: ItemId) -> Result<Vec<Quote>, StoreError> {
        delegate!(self, s => s.list_quotes(item_id))
    }

    async fn get_quote(&self, id: QuoteId) -> Result<Option<Quote>, StoreError> {
        delegate!(self, s => s.get_quote(id))
    }

    async fn update_quote(&self, quote: Quote) -> Result<Quote, StoreError> {
        delegate!(self, s => s.update_quote(quote))
    }

    async fn delete_quote(&self, id: QuoteId) -> Result<(), StoreError> {
        delegate!(self, s => s.delete_quote(id))
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        delegate!(self, s => s.history())
    }
}
