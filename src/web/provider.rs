//! Web search providers.

use super::WebSearchProvider;
use crate::config::{WebSearchProviderKind, WebSearchSettings};
use crate::error::{Result, VoxError};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const DUCKDUCKGO_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const BRAVE_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";

/// Create the configured search provider.
pub fn create_provider(settings: &WebSearchSettings) -> Result<Arc<dyn WebSearchProvider>> {
    let http = reqwest::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(Duration::from_secs(settings.search_timeout_secs))
        .build()?;

    match settings.provider {
        WebSearchProviderKind::DuckDuckGo => Ok(Arc::new(DuckDuckGoSearch::new(http))),
        WebSearchProviderKind::Brave => {
            let api_key = settings
                .brave_api_key
                .clone()
                .ok_or_else(|| VoxError::Config("BRAVE_API_KEY is not set".to_string()))?;
            Ok(Arc::new(BraveSearch::new(http, api_key)))
        }
    }
}

/// Scrapes the DuckDuckGo HTML results page. Needs no API key.
pub struct DuckDuckGoSearch {
    http: reqwest::Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: DUCKDUCKGO_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl WebSearchProvider for DuckDuckGoSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VoxError::UpstreamStatus {
                service: "duckduckgo".to_string(),
                status: response.status().as_u16(),
            });
        }

        let html = response.text().await?;
        let urls = parse_duckduckgo_results(&html, limit);
        debug!("DuckDuckGo returned {} urls", urls.len());
        Ok(urls)
    }
}

/// Extract result URLs from a DuckDuckGo HTML results page.
///
/// Redirect links (`/l/?uddg=...`) are decoded, ads and non-http(s) links
/// are skipped and duplicates removed.
pub fn parse_duckduckgo_results(html: &str, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a.result__a") else {
        return Vec::new();
    };

    let mut urls: Vec<String> = Vec::new();
    for link in document.select(&selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(target) = resolve_duckduckgo_href(href) else {
            continue;
        };
        if !urls.contains(&target) {
            urls.push(target);
        }
        if urls.len() >= limit {
            break;
        }
    }
    urls
}

fn resolve_duckduckgo_href(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;
    let target = if parsed.host_str().is_some_and(|h| h.ends_with("duckduckgo.com")) {
        if parsed.path() == "/y.js" {
            return None;
        }
        let (_, uddg) = parsed.query_pairs().find(|(k, _)| k == "uddg")?;
        Url::parse(&uddg).ok()?
    } else {
        parsed
    };

    matches!(target.scheme(), "http" | "https").then(|| target.to_string())
}

/// Brave Search API client.
pub struct BraveSearch {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl BraveSearch {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self {
            http,
            api_key,
            endpoint: BRAVE_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl WebSearchProvider for BraveSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let count = limit.to_string();
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("q", query), ("count", count.as_str())])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VoxError::UpstreamStatus {
                service: "brave".to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        parse_brave_response(&body, limit)
    }
}

/// Extract result URLs from a Brave web search response body.
pub fn parse_brave_response(body: &str, limit: usize) -> Result<Vec<String>> {
    let json: serde_json::Value = serde_json::from_str(body)?;
    let Some(results) = json["web"]["results"].as_array() else {
        return Ok(Vec::new());
    };

    Ok(results
        .iter()
        .filter_map(|r| r["url"].as_str())
        .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
        .take(limit)
        .map(str::to_string)
        .collect())
}
