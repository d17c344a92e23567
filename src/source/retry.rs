//! Bounded retry with linearly growing backoff.

use std::future::Future;
use std::time::Duration;

use log::error;

use crate::error::SourceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Pause after the given failed attempt (1-based): `base_delay * attempt`,
    /// saturating at [`Duration::MAX`].
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(attempt)
            .unwrap_or(Duration::MAX)
    }

    /// Runs `op` until it succeeds or the attempts run out, returning the last
    /// error. There is no pause after the final attempt.
    pub async fn run<F, Fut, T>(&self, label: &str, mut op: F) -> Result<T, SourceError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    error!("Attempt {attempt} failed for {label}: {e}");
                    if attempt >= attempts {
                        return Err(e);
                    }
                    tokio::time::sleep(self.delay_after(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
