//! Request DTOs and response views.
//!
//! Domain types serialize directly where nothing needs enriching; quotes are
//! wrapped in [`QuoteView`] so every response carries the expiry flag and the
//! age classification computed against "today".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pricelab_core::ProcessId;
use pricelab_pricing::expiry;
use pricelab_pricing::{Quote, QuoteAge};
use pricelab_storage::HistoryEntry;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProcessRequest {
    pub process_number: String,
    pub object: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProcessRequest {
    pub process_number: String,
    pub object: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    /// Assigned after the process's current maximum when omitted.
    pub item_number: Option<u32>,
    pub specification: String,
    pub unit: String,
    pub quantity: f64,
    pub pricing_strategy: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub item_number: u32,
    pub specification: String,
    pub unit: String,
    pub quantity: f64,
    /// Keeps the current strategy when omitted.
    pub pricing_strategy: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// Raw text pasted from a spreadsheet.
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    /// Every item id of the process, in the desired order.
    pub item_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateQuoteRequest {
    pub source: String,
    /// Accepts the same formats as the batch importer.
    pub quote_date: String,
    pub unit_price: f64,
    pub quote_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuoteRequest {
    pub source: String,
    pub quote_date: String,
    pub unit_price: f64,
    pub quote_type: Option<String>,
    pub is_outlier: Option<bool>,
}

// -------------------------
// Response views
// -------------------------

/// A quote plus its derived aging, as returned by every quote endpoint.
#[derive(Debug, Serialize)]
pub struct QuoteView {
    #[serde(flatten)]
    pub quote: Quote,
    pub is_expired: bool,
    pub age: QuoteAge,
}

impl QuoteView {
    pub fn of(quote: Quote, today: NaiveDate) -> Self {
        let is_expired = expiry::is_expired(quote.quote_date, quote.quote_type, today);
        let age = expiry::classify(quote.quote_date, quote.quote_type, today);
        Self { quote, is_expired, age }
    }
}

/// One row of `GET /api/history`: a quote with its item and process context.
#[derive(Debug, Serialize)]
pub struct HistoryView {
    pub quote: QuoteView,
    pub item_number: u32,
    pub specification: String,
    pub unit: String,
    pub process_id: ProcessId,
    pub process_number: String,
    pub object: String,
}

impl HistoryView {
    pub fn of(entry: HistoryEntry, today: NaiveDate) -> Self {
        Self {
            quote: QuoteView::of(entry.quote, today),
            item_number: entry.item_number,
            specification: entry.specification,
            unit: entry.unit,
            process_id: entry.process_id,
            process_number: entry.process_number,
            object: entry.object,
        }
    }
}
