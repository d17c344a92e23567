//! Banco de la Nación Argentina, read from the cash ("billetes") table on its
//! home page.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::info;

use super::page::{PageLauncher, PageSession, SessionGuard};
use super::{QuoteSource, RawQuote};
use crate::error::SourceError;
use crate::exchange_rate::Bank;
use crate::normalize::Notation;

pub const BNA_URL: &str = "https://www.bna.com.ar/";

const DATE_SELECTOR: &str = ".fechaCot";
const BUY_SELECTOR: &str = "#billetes table tbody tr:nth-child(1) td:nth-child(2)";
const SELL_SELECTOR: &str = "#billetes table tbody tr:nth-child(1) td:nth-child(3)";

pub struct BnaSource {
    launcher: Arc<dyn PageLauncher>,
    url: String,
    settle: Duration,
}

impl BnaSource {
    pub fn new(launcher: Arc<dyn PageLauncher>, settle: Duration) -> Self {
        Self {
            launcher,
            url: BNA_URL.to_string(),
            settle,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    async fn scrape(&self, session: &mut dyn PageSession) -> Result<RawQuote, SourceError> {
        info!("Accessing BNA website");
        session.navigate(&self.url).await?;
        session.settle(self.settle).await;

        let quote_date = session.find_text(DATE_SELECTOR).await?;
        let buy = session.find_text(BUY_SELECTOR).await?;
        let sell = session.find_text(SELL_SELECTOR).await?;

        Ok(RawQuote {
            quote_date,
            buy,
            sell,
            notation: Notation::DecimalComma,
        })
    }
}

#[async_trait]
impl QuoteSource for BnaSource {
    fn bank(&self) -> Bank {
        Bank::Bna
    }

    async fn fetch(&self) -> Result<RawQuote, SourceError> {
        info!("Starting BNA exchange rate collection");
        let mut guard = SessionGuard::new(self.launcher.launch().await?, self.bank());
        let outcome = self.scrape(guard.session()?).await;
        guard.release().await;
        outcome
    }
}
