//! Browser-like page access for sources that scrape rendered pages.
//!
//! A [`PageLauncher`] opens one [`PageSession`] per fetch. The source holds it
//! in a [`SessionGuard`] and closes it once extraction is over; a guard dropped
//! while still holding its session, after a panic or a cancelled fetch, closes
//! it on a background task.
//!
//! [`HttpLauncher`] loads pages with `reqwest` and evaluates CSS selectors with
//! `scraper`. It does not execute scripts; a WebDriver-backed launcher can be
//! dropped in behind the same traits for pages that only render client side.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::SourceError;
use crate::exchange_rate::Bank;

#[async_trait]
pub trait PageLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageSession>, SourceError>;
}

#[async_trait]
pub trait PageSession: Send + Sync {
    async fn navigate(&mut self, url: &str) -> Result<(), SourceError>;

    /// Fixed grace period for dynamic content after navigation.
    async fn settle(&mut self, grace: Duration) {
        tokio::time::sleep(grace).await;
    }

    /// Text of the first element matching `selector`.
    async fn find_text(&self, selector: &str) -> Result<String, SourceError>;

    /// Text of every element matching `selector`, in document order.
    async fn find_all_text(&self, selector: &str) -> Result<Vec<String>, SourceError>;

    async fn close(&mut self) -> Result<(), SourceError>;
}

/// Closes a session, logging instead of failing when the close itself fails.
pub async fn release(mut session: Box<dyn PageSession>, bank: Bank) {
    match session.close().await {
        Ok(()) => info!("{bank} browser session closed"),
        Err(e) => warn!("Could not properly close {bank} browser session: {e}"),
    }
}

/// Owns a session for the length of one fetch.
pub struct SessionGuard {
    session: Option<Box<dyn PageSession>>,
    bank: Bank,
}

impl SessionGuard {
    pub fn new(session: Box<dyn PageSession>, bank: Bank) -> Self {
        Self {
            session: Some(session),
            bank,
        }
    }

    pub fn session(&mut self) -> Result<&mut dyn PageSession, SourceError> {
        match self.session.as_deref_mut() {
            Some(session) => Ok(session),
            None => Err(SourceError::Navigation(format!(
                "{} browser session already closed",
                self.bank
            ))),
        }
    }

    pub async fn release(mut self) {
        if let Some(session) = self.session.take() {
            release(session, self.bank).await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let bank = self.bank;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!("{bank} browser session abandoned, closing it in the background");
                handle.spawn(release(session, bank));
            }
            Err(_) => warn!("{bank} browser session dropped outside a runtime, not closed"),
        }
    }
}

pub struct HttpLauncher {
    client: Client,
}

impl HttpLauncher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageLauncher for HttpLauncher {
    async fn launch(&self) -> Result<Box<dyn PageSession>, SourceError> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            document: None,
        }))
    }
}

struct HttpSession {
    client: Client,
    document: Option<String>,
}

impl HttpSession {
    fn select_texts(&self, selector: &str) -> Result<Vec<String>, SourceError> {
        let body = self
            .document
            .as_deref()
            .ok_or_else(|| SourceError::Extraction("no page loaded".to_string()))?;
        let parsed = Selector::parse(selector).map_err(|e| {
            SourceError::Extraction(format!("invalid selector {selector:?}: {e}"))
        })?;

        let html = Html::parse_document(body);
        Ok(html
            .select(&parsed)
            .map(|element| {
                element
                    .text()
                    .flat_map(str::split_whitespace)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect())
    }
}

#[async_trait]
impl PageSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Navigation(format!("{url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Navigation(format!("{url} answered {status}")));
        }
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Navigation(format!("{url}: {e}")))?;
        debug!("Loaded {url} ({} bytes)", body.len());
        self.document = Some(body);
        Ok(())
    }

    async fn find_text(&self, selector: &str) -> Result<String, SourceError> {
        self.select_texts(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::Extraction(format!("no element matches {selector:?}")))
    }

    async fn find_all_text(&self, selector: &str) -> Result<Vec<String>, SourceError> {
        self.select_texts(selector)
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        self.document = None;
        Ok(())
    }
}
