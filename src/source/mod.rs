//! Quote sources, one per bank.
//!
//! Page sources (BNA, Banco Provincia) read rates off a rendered page through
//! a [`page::PageLauncher`]; API sources (BBVA, Banco Ciudad) read a JSON
//! endpoint. Every source reports failure as a [`SourceError`] value and
//! releases its browser session or HTTP client before returning.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::Config;
use crate::error::SourceError;
use crate::exchange_rate::Bank;
use crate::normalize::Notation;

pub mod bbva;
pub mod bna;
pub mod ciudad;
pub mod page;
pub mod provincia;
pub mod retry;

pub use bbva::BbvaSource;
pub use bna::BnaSource;
pub use ciudad::CiudadSource;
pub use page::{HttpLauncher, PageLauncher, PageSession};
pub use provincia::ProvinciaSource;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Quote text as a source published it, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuote {
    /// Date the source says the rate applies to, in whatever format it uses.
    pub quote_date: String,
    pub buy: String,
    pub sell: String,
    /// How `buy` and `sell` are written.
    pub notation: Notation,
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn bank(&self) -> Bank;

    async fn fetch(&self) -> Result<RawQuote, SourceError>;
}

pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(BROWSER_USER_AGENT)
        .build()
}

/// The configured sources in collection order: BNA, Banco Provincia, BBVA,
/// Banco Ciudad.
pub fn default_sources(config: &Config) -> reqwest::Result<Vec<Arc<dyn QuoteSource>>> {
    let client = http_client(config.http_timeout)?;
    let launcher: Arc<dyn PageLauncher> = Arc::new(HttpLauncher::new(client.clone()));

    Ok(vec![
        Arc::new(BnaSource::new(Arc::clone(&launcher), config.settle)),
        Arc::new(ProvinciaSource::new(launcher, config.settle)),
        Arc::new(BbvaSource::new(client)),
        Arc::new(CiudadSource::new(config.http_timeout, config.retry.clone())),
    ])
}

/// Text of a JSON value that may be published as a number or a string.
pub(crate) fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub(crate) fn today(format: &str) -> String {
    chrono::Local::now().date_naive().format(format).to_string()
}
