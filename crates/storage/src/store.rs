use serde::Serialize;
use thiserror::Error;

use pricelab_core::{ItemId, ProcessId, QuoteId};
use pricelab_pricing::{Item, Process, Quote};

/// Storage operation error.
///
/// Infrastructure failures (I/O, SQL) as opposed to domain validation, which
/// is handled before records reach the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record (or its parent) does not exist.
    #[error("not found")]
    NotFound,

    /// A reorder request did not name exactly the process's items.
    #[error("invalid reorder: {0}")]
    InvalidReorder(String),

    #[error("persistence io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// A quote joined with its item and process context, for the history screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub quote: Quote,
    pub item_number: u32,
    pub specification: String,
    pub unit: String,
    pub process_id: ProcessId,
    pub process_number: String,
    pub object: String,
}

/// Persistence operations shared by both backends.
///
/// Semantics every implementation must honor:
/// - deleting a process removes its items and their quotes; deleting an item
///   removes its quotes (cascade completeness)
/// - creating a child under a missing parent is `NotFound`
/// - batch creates are all-or-nothing
/// - `reorder_items` applies a full permutation of a process's items in one
///   transaction or not at all
/// - listings are sorted: processes newest first, items by `item_number`,
///   quotes and history by `quote_date` descending
#[allow(async_fn_in_trait)]
pub trait PriceStore: Send + Sync {
    // -- processes

    async fn create_process(&self, process: Process) -> Result<Process, StoreError>;
    async fn list_processes(&self) -> Result<Vec<Process>, StoreError>;
    async fn get_process(&self, id: ProcessId) -> Result<Option<Process>, StoreError>;
    async fn update_process(&self, process: Process) -> Result<Process, StoreError>;
    async fn delete_process(&self, id: ProcessId) -> Result<(), StoreError>;

    // -- items

    async fn create_item(&self, item: Item) -> Result<Item, StoreError>;
    /// All-or-nothing batch insert (every item must share an existing process).
    async fn create_items(&self, items: Vec<Item>) -> Result<Vec<Item>, StoreError>;
    async fn list_items(&self, process_id: ProcessId) -> Result<Vec<Item>, StoreError>;
    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError>;
    async fn update_item(&self, item: Item) -> Result<Item, StoreError>;
    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError>;
    /// Renumber a process's items to match `ordered` (1-based positions).
    async fn reorder_items(
        &self,
        process_id: ProcessId,
        ordered: Vec<ItemId>,
    ) -> Result<(), StoreError>;

    // -- quotes

    async fn create_quote(&self, quote: Quote) -> Result<Quote, StoreError>;
    async fn create_quotes(&self, quotes: Vec<Quote>) -> Result<Vec<Quote>, StoreError>;
    async fn list_quotes(&self, item_id: ItemId) -> Result<Vec<Quote>, StoreError>;
    async fn get_quote(&self, id: QuoteId) -> Result<Option<Quote>, StoreError>;
    async fn update_quote(&self, quote: Quote) -> Result<Quote, StoreError>;
    async fn delete_quote(&self, id: QuoteId) -> Result<(), StoreError>;

    // -- history

    /// Every quote with its item and process context, newest first.
    async fn history(&self) -> Result<Vec<HistoryEntry>, StoreError>;
}
