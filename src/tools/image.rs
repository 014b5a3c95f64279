//! Image lookup against a Wallhaven-compatible search API.

use crate::config::ToolSettings;
use crate::error::{Result, VoxError};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Returned when no image could be found.
pub const IMAGE_NOT_FOUND: &str = "No image found.";

/// A single image search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHit {
    /// Direct URL of the full-size image.
    pub path: String,
}

/// An image search backend.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<ImageHit>>;
}

/// Search for an image and return one result path chosen uniformly at random.
///
/// Never fails: zero results, upstream errors and malformed bodies all yield
/// [`IMAGE_NOT_FOUND`]. No retry is attempted.
pub async fn get_image(service: &dyn ImageSearch, query: &str) -> String {
    let hits = match service.search(query).await {
        Ok(hits) => hits,
        Err(e) => {
            warn!("Image search failed: {}", e);
            return IMAGE_NOT_FOUND.to_string();
        }
    };

    match pick_random(&hits) {
        Some(hit) => hit.path.clone(),
        None => {
            debug!("No images for {}", query);
            IMAGE_NOT_FOUND.to_string()
        }
    }
}

/// Choose one item uniformly at random.
pub(crate) fn pick_random<T>(items: &[T]) -> Option<&T> {
    items.choose(&mut rand::thread_rng())
}

/// Wallhaven search API client.
pub struct WallhavenClient {
    http: reqwest::Client,
    endpoint: String,
}

impl WallhavenClient {
    pub fn new(settings: &ToolSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: settings.image_search_endpoint.clone(),
        })
    }
}

#[async_trait]
impl ImageSearch for WallhavenClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<ImageHit>> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(VoxError::UpstreamStatus {
                service: "image search".to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        parse_wallhaven_response(&body)
    }
}

/// Extract image paths from a Wallhaven `/search` response body.
///
/// Entries without a string `path` are skipped.
pub fn parse_wallhaven_response(body: &str) -> Result<Vec<ImageHit>> {
    let json: serde_json::Value = serde_json::from_str(body)?;
    let data = json["data"]
        .as_array()
        .ok_or_else(|| VoxError::Tool("Image search response has no 'data' array".to_string()))?;

    Ok(data
        .iter()
        .filter_map(|item| item["path"].as_str())
        .filter(|path| !path.is_empty())
        .map(|path| ImageHit {
            path: path.to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeImageSearch;

    #[test]
    fn test_parse_wallhaven_response() {
        let body = r#"{
            "data": [
                {"id": "1", "path": "https://w.wallhaven.cc/full/1.jpg"},
                {"id": "2"},
                {"id": "3", "path": "https://w.wallhaven.cc/full/3.png"}
            ],
            "meta": {"total": 3}
        }"#;

        let hits = parse_wallhaven_response(body).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].path, "https://w.wallhaven.cc/full/3.png");
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(parse_wallhaven_response("<html>rate limited</html>").is_err());
        assert!(parse_wallhaven_response(r#"{"error": "bad"}"#).is_err());
        assert!(parse_wallhaven_response(r#"{"data": []}"#).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_image_picks_from_results() {
        let paths = vec!["https://img/a.jpg", "https://img/b.jpg", "https://img/c.jpg"];
        let service = FakeImageSearch::with_paths(paths.clone());

        for _ in 0..10 {
            let result = get_image(&service, "sunset photo").await;
            assert!(paths.contains(&result.as_str()));
        }
    }

    #[tokio::test]
    async fn test_get_image_not_found_cases() {
        let empty = FakeImageSearch::with_paths(vec![]);
        assert_eq!(get_image(&empty, "nothing").await, IMAGE_NOT_FOUND);

        let failing = FakeImageSearch::failing_status(503);
        assert_eq!(get_image(&failing, "anything").await, IMAGE_NOT_FOUND);
    }
}
