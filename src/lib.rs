//! Collects USD/ARS quotes from Argentine banks into an append-only CSV store
//! and answers chat queries about the latest values.
//!
//! - `source` — one adapter per bank, page scrapers and JSON APIs.
//! - `collector` — runs every source once per cycle, isolating failures.
//! - `normalize` — canonical dates and numbers.
//! - `store` — the CSV sink and its reader.
//! - `query` / `render` / `bot` — lookups and the conversational front end.

pub mod bot;
pub mod collector;
pub mod config;
pub mod error;
pub mod exchange_rate;
pub mod normalize;
pub mod query;
pub mod render;
pub mod source;
pub mod store;

pub use collector::Collector;
pub use config::Config;
pub use exchange_rate::{Bank, QuoteRecord, RateValue, Rates, Status};
pub use query::{QueryCommand, QueryResult, QueryService};
pub use store::QuoteStore;
