//! Video lookup against the YouTube Data API.

use super::image::pick_random;
use crate::config::ToolSettings;
use crate::error::{Result, VoxError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{instrument, warn};

/// Returned when no video could be found.
pub const VIDEO_NOT_FOUND: &str = "No video found.";

/// A single video search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoHit {
    pub id: String,
    pub title: String,
}

/// A video search backend.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<VideoHit>>;
}

/// Format a video hit as a playable link sentence.
pub fn format_video_link(query: &str, hit: &VideoHit) -> String {
    format!(
        "Here is a video related to {}: https://www.youtube.com/watch?v={}",
        query, hit.id
    )
}

/// Search for a video and return one candidate chosen uniformly at random.
///
/// Never fails: zero results, upstream errors and malformed bodies all yield
/// [`VIDEO_NOT_FOUND`].
pub async fn get_video(service: &dyn VideoSearch, query: &str) -> String {
    match service.search(query).await {
        Ok(hits) => pick_random(&hits)
            .map(|hit| format_video_link(query, hit))
            .unwrap_or_else(|| VIDEO_NOT_FOUND.to_string()),
        Err(e) => {
            warn!("Video search failed: {}", e);
            VIDEO_NOT_FOUND.to_string()
        }
    }
}

/// YouTube Data API v3 search client.
pub struct YoutubeClient {
    http: reqwest::Client,
    search_url: String,
    api_key: Option<String>,
    max_results: u32,
}

impl YoutubeClient {
    pub fn new(settings: &ToolSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            search_url: settings.video_search_url.clone(),
            api_key: settings.youtube_api_key.clone(),
            max_results: settings.max_video_results,
        })
    }
}

#[async_trait]
impl VideoSearch for YoutubeClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<VideoHit>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| VoxError::Config("GOOGLE_API_KEY is not set".to_string()))?;

        let max_results = self.max_results.to_string();
        let response = self
            .http
            .get(&self.search_url)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("key", api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(VoxError::UpstreamStatus {
                service: "video search".to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let mut hits = parse_youtube_response(&body)?;
        hits.truncate(self.max_results as usize);
        Ok(hits)
    }
}

/// Extract video ids and titles from a YouTube `search.list` response body.
///
/// Items without a `videoId` (channels, playlists) are skipped.
pub fn parse_youtube_response(body: &str) -> Result<Vec<VideoHit>> {
    let json: serde_json::Value = serde_json::from_str(body)?;
    let items = json["items"]
        .as_array()
        .ok_or_else(|| VoxError::Tool("Video search response has no 'items' array".to_string()))?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let id = item["id"]["videoId"].as_str()?;
            let title = item["snippet"]["title"].as_str().unwrap_or_default();
            Some(VideoHit {
                id: id.to_string(),
                title: title.to_string(),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeVideoSearch;

    #[test]
    fn test_parse_youtube_response() {
        let body = r#"{
            "kind": "youtube#searchListResponse",
            "items": [
                {"id": {"kind": "youtube#video", "videoId": "dQw4w9WgXcQ"}, "snippet": {"title": "Trailer"}},
                {"id": {"kind": "youtube#channel", "channelId": "UC123"}, "snippet": {"title": "Channel"}},
                {"id": {"kind": "youtube#video", "videoId": "abc123def45"}}
            ]
        }"#;

        let hits = parse_youtube_response(body).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "dQw4w9WgXcQ");
        assert_eq!(hits[0].title, "Trailer");
        assert_eq!(hits[1].title, "");
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(parse_youtube_response("").is_err());
        assert!(parse_youtube_response(r#"{"error": {"code": 403}}"#).is_err());
    }

    #[test]
    fn test_format_video_link() {
        let hit = VideoHit {
            id: "xyz".to_string(),
            title: "Gameplay".to_string(),
        };
        assert_eq!(
            format_video_link("genshin gameplay", &hit),
            "Here is a video related to genshin gameplay: https://www.youtube.com/watch?v=xyz"
        );
    }

    #[tokio::test]
    async fn test_get_video_shape() {
        let service = FakeVideoSearch::with_hits(vec![("id1", "One"), ("id2", "Two")]);
        let result = get_video(&service, "boss fight").await;
        assert!(result.starts_with("Here is a video related to boss fight: https://www.youtube.com/watch?v=id"));

        let empty = FakeVideoSearch::with_hits(vec![]);
        assert_eq!(get_video(&empty, "boss fight").await, VIDEO_NOT_FOUND);

        let failing = FakeVideoSearch::failing_status(403);
        assert_eq!(get_video(&failing, "boss fight").await, VIDEO_NOT_FOUND);
    }
}
