//! BBVA Argentina, read from the public foreign-currency quotes endpoint.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde_json::Value;

use super::{QuoteSource, RawQuote, json_text, today};
use crate::error::SourceError;
use crate::exchange_rate::Bank;
use crate::normalize::Notation;

pub const BBVA_URL: &str =
    "https://servicios.bbva.com.ar/openmarket/servicios/cotizaciones/monedaExtranjera";

pub struct BbvaSource {
    client: Client,
    url: String,
}

impl BbvaSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            url: BBVA_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// Finds the dollar entry in `respuesta[]` and returns its buy and sell prices.
fn dollar_rates(payload: &Value) -> Result<(String, String), SourceError> {
    let entries = payload
        .get("respuesta")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Parse("BBVA response has no \"respuesta\" list".to_string()))?;

    let dollar = entries
        .iter()
        .find(|entry| {
            entry
                .pointer("/moneda/descripcionLarga")
                .and_then(Value::as_str)
                .is_some_and(|name| name.to_lowercase().contains("dolar"))
        })
        .ok_or_else(|| SourceError::Parse("dollar rate not found in BBVA response".to_string()))?;

    let price = |field: &str| {
        dollar
            .get(field)
            .and_then(json_text)
            .ok_or_else(|| SourceError::Parse(format!("BBVA dollar entry has no {field}")))
    };
    Ok((price("precioCompra")?, price("precioVenta")?))
}

#[async_trait]
impl QuoteSource for BbvaSource {
    fn bank(&self) -> Bank {
        Bank::Bbva
    }

    async fn fetch(&self) -> Result<RawQuote, SourceError> {
        info!("Starting BBVA exchange rate collection (using JSON endpoint)");

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Request(format!("BBVA answered {status}")));
        }
        let body = response.text().await?;

        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| SourceError::Parse(format!("BBVA response is not JSON: {e}")))?;
        debug!("Full BBVA response: {payload}");

        let (buy, sell) = dollar_rates(&payload)?;
        info!("BBVA rates: Compra={buy}, Venta={sell}");

        Ok(RawQuote {
            quote_date: today("%Y-%m-%d"),
            buy,
            sell,
            notation: Notation::Inferred,
        })
    }
}
