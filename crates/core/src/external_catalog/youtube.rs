//! YouTube Data API search client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{VideoSearchHit, VideoSearchQuery};
use super::{check_status, CatalogError, VideoSearch};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube search client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeSearchConfig {
    pub api_key: String,
    /// Base URL (default: https://www.googleapis.com/youtube/v3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl YouTubeSearchConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }
}

/// YouTube search client.
pub struct YouTubeSearchClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl YouTubeSearchClient {
    pub fn new(config: YouTubeSearchConfig) -> Result<Self, CatalogError> {
        if config.api_key.is_empty() {
            return Err(CatalogError::NotConfigured(
                "YouTube API key is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl VideoSearch for YouTubeSearchClient {
    async fn search_videos(
        &self,
        query: &VideoSearchQuery,
    ) -> Result<Vec<VideoSearchHit>, CatalogError> {
        let url = format!("{}/search", self.base_url);

        debug!(
            "YouTube search: q='{}', lang={}, region={}",
            query.text, query.relevance_language, query.region_code
        );

        let max_results = query.max_results.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("q", query.text.as_str()),
                ("relevanceLanguage", query.relevance_language.as_str()),
                ("regionCode", query.region_code.as_str()),
                ("safeSearch", "none"),
            ])
            .send()
            .await?;

        let response = check_status(response, "YouTube search").await?;

        let body: SearchResponse = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse search response: {}", e))
        })?;

        Ok(body.items.into_iter().filter_map(|i| i.into_hit()).collect())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
    published_at: Option<String>,
}

impl SearchItem {
    /// Hits without a video id (channels, playlists) are dropped.
    fn into_hit(self) -> Option<VideoSearchHit> {
        let video_id = self.id.video_id.filter(|id| !id.is_empty())?;
        let published_at = self
            .snippet
            .published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Some(VideoSearchHit {
            video_id,
            title: self.snippet.title,
            channel_title: self.snippet.channel_title,
            published_at,
        })
    }
}
