//! Page retrieval

use crate::config::CrawlSettings;
use crate::errors::{http_error, Result};
use crate::text::html_to_text;
use async_trait::async_trait;
use quiver_core::errors::{ExError, ExErrorKind};
use reqwest::Client;
use std::time::Duration;

/// Source of readable page text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher with retries and linear backoff
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    backoff: Duration,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// `ExternalService` when the HTTP client cannot be built.
    pub fn new(settings: &CrawlSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout))
            .build()
            .map_err(|e| {
                ExError::new(ExErrorKind::ExternalService)
                    .with_op("http_client")
                    .with_message(e.to_string())
            })?;
        Ok(Self {
            client,
            max_retries: settings.max_retries.max(1),
            backoff: Duration::from_secs(1),
        })
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| http_error(url, e))?
            .error_for_status()
            .map_err(|e| http_error(url, e))?
            .text()
            .await
            .map_err(|e| http_error(url, e))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let mut attempt = 1;
        loop {
            match self.fetch_once(url).await {
                Ok(html) => return Ok(html_to_text(&html)),
                Err(e) if attempt < self.max_retries => {
                    tracing::warn!(url, attempt, error = %e, "fetch failed, retrying");
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
