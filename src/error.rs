//! Error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::exchange_rate::Status;

/// Why a quote source could not produce a quote.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The page could not be reached or the browser session could not start.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The page loaded but the expected elements were missing.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Network failure, timeout or error status on an API call.
    #[error("request failed: {0}")]
    Request(String),

    /// The API answered with something other than the expected JSON.
    #[error("parse failed: {0}")]
    Parse(String),
}

impl SourceError {
    /// Status recorded for a quote that failed with this error.
    pub fn status(&self) -> Status {
        match self {
            SourceError::Navigation(_) => Status::CriticalError(self.to_string()),
            _ => Status::Error(self.to_string()),
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Request(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("quote store not found at {}", .0.display())]
    Unavailable(PathBuf),

    #[error("quote store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("quote store CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file exists but its header lacks columns this store writes.
    #[error("quote store {} is missing columns: {missing}", .path.display())]
    IncompatibleHeader { path: PathBuf, missing: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
