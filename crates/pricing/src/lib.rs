//! `pricelab-pricing` — price-research domain.
//!
//! Records (`Process`, `Item`, `Quote`), the statistics engine that turns a
//! list of unit-price quotes into estimator values, the quote expiry/aging
//! classifier, and the batch-import text parsers.

pub mod expiry;
pub mod import;
pub mod item;
pub mod process;
pub mod quote;
pub mod stats;

pub use expiry::QuoteAge;
pub use item::{Item, PricingStrategy};
pub use process::Process;
pub use quote::{Quote, QuoteType};
pub use stats::PriceStatistics;
