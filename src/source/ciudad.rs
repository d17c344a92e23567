//! Banco Ciudad, read from the JSON endpoint behind its institutional site.
//!
//! The endpoint sits behind an anti-bot layer: the client first visits the
//! site to pick up cookies, sends browser-like headers, and retries with
//! backoff when it is served a challenge page instead of JSON.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info, warn};
use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::Value;

use super::retry::RetryPolicy;
use super::{BROWSER_USER_AGENT, QuoteSource, RawQuote, json_text, today};
use crate::error::SourceError;
use crate::exchange_rate::Bank;
use crate::normalize::Notation;

pub const CIUDAD_HOME_URL: &str = "https://bancociudad.com.ar/institucional/";

const QUOTES_PATH: &str = "herramientas/getCotizacionesInicio";

pub struct CiudadSource {
    home_url: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl CiudadSource {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            home_url: CIUDAD_HOME_URL.to_string(),
            timeout,
            retry,
        }
    }

    /// Points the source at another institutional root; must end with `/`.
    pub fn with_home_url(mut self, url: impl Into<String>) -> Self {
        self.home_url = url.into();
        self
    }

    fn quotes_url(&self) -> String {
        format!("{}{QUOTES_PATH}", self.home_url)
    }

    /// A fresh cookie-keeping client, dropped when the fetch ends.
    fn session(&self) -> Result<Client, SourceError> {
        let referer = HeaderValue::from_str(&self.home_url)
            .map_err(|e| SourceError::Request(format!("invalid referer: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(header::REFERER, referer);
        headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));

        Ok(Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .user_agent(BROWSER_USER_AGENT)
            .timeout(self.timeout)
            .build()?)
    }

    async fn attempt(&self, client: &Client) -> Result<RawQuote, SourceError> {
        // Cache-busting parameter, as the site's own script sends it.
        let url = format!("{}?_={}", self.quotes_url(), Utc::now().timestamp_millis());

        let response = client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Request(format!("Banco Ciudad answered {status}")));
        }
        let body = response.text().await?;

        let (buy, sell) = dollar_rates(&body)?;
        info!("Banco Ciudad rates: Compra={buy}, Venta={sell}");

        Ok(RawQuote {
            quote_date: today("%d/%m/%Y"),
            buy,
            sell,
            notation: Notation::DecimalComma,
        })
    }
}

/// Extracts `data.dolar.compra` and `data.dolar.venta` from the response body.
fn dollar_rates(body: &str) -> Result<(String, String), SourceError> {
    let payload: Value = match serde_json::from_str(body) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Failed to decode JSON from Banco Ciudad: {e}");
            debug!("Banco Ciudad response content: {body}");
            let reason = if body.contains("CAPTCHA") {
                "CAPTCHA detected"
            } else {
                "failed to decode JSON from Banco Ciudad"
            };
            return Err(SourceError::Parse(reason.to_string()));
        }
    };

    let dollar = payload
        .pointer("/data/dolar")
        .ok_or_else(|| SourceError::Parse("Banco Ciudad response has no data.dolar".to_string()))?;
    let price = |field: &str| {
        dollar
            .get(field)
            .and_then(json_text)
            .ok_or_else(|| SourceError::Parse(format!("Banco Ciudad dollar entry has no {field}")))
    };
    Ok((price("compra")?, price("venta")?))
}

#[async_trait]
impl QuoteSource for CiudadSource {
    fn bank(&self) -> Bank {
        Bank::Ciudad
    }

    async fn fetch(&self) -> Result<RawQuote, SourceError> {
        info!("Starting Banco Ciudad exchange rate collection");
        let client = self.session()?;

        if let Err(e) = client.get(&self.home_url).send().await {
            warn!("Failed to get initial cookies: {e}");
        }

        self.retry
            .run("Banco Ciudad", |_| self.attempt(&client))
            .await
    }
}
