//! `pricelab-storage` — persistence for processes, items and quotes.
//!
//! One storage trait ([`PriceStore`]), two backends:
//! - [`JsonFileStore`]: the whole dataset as a single JSON document,
//!   rewritten atomically on every mutation (dev / small deployments).
//! - [`SqliteStore`]: sqlx-backed SQLite with `ON DELETE CASCADE` foreign
//!   keys and a transactional reorder.

pub mod json;
pub mod sqlite;
pub mod store;

pub use json::JsonFileStore;
pub use sqlite::SqliteStore;
pub use store::{HistoryEntry, PriceStore, StoreError};
