// src/fetch/client.rs
use crate::fetch::ImageFetcher;
use crate::utils::config::Settings;
use crate::utils::error::FetchError;
use async_trait::async_trait;
use reqwest::header;
use std::time::Duration;

/// Fetches images over HTTP with a fixed user agent and per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        Self::new(&settings.image_fetch_user_agent, settings.image_fetch_timeout)
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!("Downloading image from: {}", url);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "image/avif,image/webp,image/*,*/*;q=0.8")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("HTTP error status: {} for URL: {}", status, url);
            return Err(FetchError::Http {
                status,
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_settings() {
        let settings = Settings::default();
        assert!(HttpImageFetcher::from_settings(&settings).is_ok());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let fetcher = HttpImageFetcher::new("test-agent", Duration::from_millis(500)).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:9/nothing.jpg").await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
