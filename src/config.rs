//! Process configuration, read once from the environment at startup.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::source::retry::RetryPolicy;

pub const DEFAULT_DATA_FILE: &str = "data/exchange_rates_v2.csv";

#[derive(Debug, Clone)]
pub struct Config {
    /// CSV file quotes are appended to and queried from.
    pub data_file: PathBuf,
    /// Grace period after loading a page before reading it.
    pub settle: Duration,
    /// Timeout applied to every HTTP request.
    pub http_timeout: Duration,
    /// Retry policy for sources that retry internally.
    pub retry: RetryPolicy,
    /// Address the query server listens on.
    pub bind_addr: String,
    /// Log file; logs go to stderr when unset.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            settle: Duration::from_secs(5),
            http_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            bind_addr: "127.0.0.1:8080".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, falling back to defaults
    /// for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secs = |key: &'static str, default: Duration| {
            parse_var(&lookup, key, default.as_secs()).map(Duration::from_secs)
        };

        Ok(Self {
            data_file: lookup("ARBOLITO_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            settle: secs("ARBOLITO_SETTLE_SECS", defaults.settle)?,
            http_timeout: secs("ARBOLITO_HTTP_TIMEOUT_SECS", defaults.http_timeout)?,
            retry: RetryPolicy {
                max_attempts: parse_var(
                    &lookup,
                    "ARBOLITO_RETRY_ATTEMPTS",
                    defaults.retry.max_attempts,
                )?,
                base_delay: secs("ARBOLITO_RETRY_BASE_SECS", defaults.retry.base_delay)?,
            },
            bind_addr: lookup("ARBOLITO_BIND_ADDR").unwrap_or(defaults.bind_addr),
            log_file: lookup("ARBOLITO_LOG_FILE").map(PathBuf::from),
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
