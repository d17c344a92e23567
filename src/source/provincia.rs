//! Banco Provincia, read from the rate widget on its home page.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::info;

use super::page::{PageLauncher, PageSession, SessionGuard};
use super::{QuoteSource, RawQuote, today};
use crate::error::SourceError;
use crate::exchange_rate::Bank;
use crate::normalize::Notation;

pub const PROVINCIA_URL: &str = "https://www.bancoprovincia.com.ar/";

// The widget renders "Compra: $…" then "Venta: $…" in elements sharing this class.
const RATE_SELECTOR: &str = r#"div[class*="paginas__sc-1t8sitw-1"]"#;

pub struct ProvinciaSource {
    launcher: Arc<dyn PageLauncher>,
    url: String,
    settle: Duration,
}

impl ProvinciaSource {
    pub fn new(launcher: Arc<dyn PageLauncher>, settle: Duration) -> Self {
        Self {
            launcher,
            url: PROVINCIA_URL.to_string(),
            settle,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    async fn scrape(&self, session: &mut dyn PageSession) -> Result<RawQuote, SourceError> {
        info!("Accessing Banco Provincia website");
        session.navigate(&self.url).await?;
        session.settle(self.settle).await;

        let texts = session.find_all_text(RATE_SELECTOR).await?;
        let [buy, sell, ..] = texts.as_slice() else {
            return Err(SourceError::Extraction(
                "could not find both buy and sell rate elements".to_string(),
            ));
        };

        Ok(RawQuote {
            // The page shows no date; the rate is taken as today's.
            quote_date: today("%d/%m/%Y"),
            buy: strip_label(buy, "Compra:"),
            sell: strip_label(sell, "Venta:"),
            notation: Notation::DecimalComma,
        })
    }
}

fn strip_label(text: &str, label: &str) -> String {
    let text = text.trim();
    let value = text.strip_prefix(label).unwrap_or(text).trim_start();
    value.strip_prefix('$').unwrap_or(value).trim().to_string()
}

#[async_trait]
impl QuoteSource for ProvinciaSource {
    fn bank(&self) -> Bank {
        Bank::Provincia
    }

    async fn fetch(&self) -> Result<RawQuote, SourceError> {
        info!("Starting Banco Provincia exchange rate collection");
        let mut guard = SessionGuard::new(self.launcher.launch().await?, self.bank());
        let outcome = self.scrape(guard.session()?).await;
        guard.release().await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::page::testing::ScriptedLauncher;

    #[test]
    fn test_strip_label() {
        assert_eq!(strip_label("Compra: $1.180,00", "Compra:"), "1.180,00");
        assert_eq!(strip_label(" Venta: $ 1.230,00 ", "Venta:"), "1.230,00");
        assert_eq!(strip_label("1.230,00", "Venta:"), "1.230,00");
    }

    #[tokio::test]
    async fn test_reads_buy_then_sell() {
        let launcher = Arc::new(
            ScriptedLauncher::default()
                .with(RATE_SELECTOR, &["Compra: $1.180,00", "Venta: $1.230,00"]),
        );
        let source = ProvinciaSource::new(launcher.clone(), Duration::ZERO);

        let quote = source.fetch().await.unwrap();
        assert_eq!(quote.buy, "1.180,00");
        assert_eq!(quote.sell, "1.230,00");
        assert_eq!(quote.quote_date, today("%d/%m/%Y"));
        assert_eq!(launcher.closed(), 1);
    }

    #[tokio::test]
    async fn test_single_element_is_extraction_error() {
        let launcher =
            Arc::new(ScriptedLauncher::default().with(RATE_SELECTOR, &["Compra: $1.180,00"]));
        let source = ProvinciaSource::new(launcher.clone(), Duration::ZERO);

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, SourceError::Extraction(_)));
        assert_eq!(launcher.closed(), 1);
    }
}
