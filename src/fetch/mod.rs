// src/fetch/mod.rs
pub mod client;

pub use client::HttpImageFetcher;

use crate::utils::error::FetchError;
use async_trait::async_trait;
use std::time::Duration;

/// Downloads image bytes for items whose image was not already captured with the page.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Wait before the second attempt; doubles after every further failure.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            initial_backoff,
        }
    }

    /// Calls `fetcher` until it succeeds or the attempts run out.
    pub async fn fetch(&self, fetcher: &dyn ImageFetcher, url: &str) -> Result<Vec<u8>, FetchError> {
        let attempts = self.attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match fetcher.fetch(url).await {
                Ok(bytes) => {
                    tracing::debug!("Fetched {} bytes from {} (attempt {})", bytes.len(), url, attempt);
                    return Ok(bytes);
                }
                Err(e) => {
                    tracing::warn!("Attempt {}/{} for {} failed: {}", attempt, attempts, url, e);
                    last_error = e.to_string();
                }
            }
            if attempt < attempts {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }

        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts,
            last: last_error,
        })
    }
}
