//! HTTP page fetcher.

use super::PageFetcher;
use crate::error::{Result, VoxError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::instrument;

/// Fetches raw HTML over HTTP with a browser-like user agent.
pub struct HttpPageFetcher {
    http: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| VoxError::PageFetch(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(VoxError::PageFetch(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("html") || ct.starts_with("text/"))
            .unwrap_or(true);
        if !is_html {
            return Err(VoxError::PageFetch(format!("{}: not an HTML page", url)));
        }

        response
            .text()
            .await
            .map_err(|e| VoxError::PageFetch(format!("{}: {}", url, e)))
    }
}
