//! TMDB (The Movie Database) API client.
//!
//! TMDB requires an API key for access.
//! Rate limits are generous (around 40 requests per second).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{MovieQuery, MovieSummary, MovieVideo, VideosQuery};
use super::{check_status, CatalogError, MovieCatalog};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// TMDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request timeout in seconds (default: 15).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl TmdbConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            timeout_secs: None,
        }
    }
}

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig) -> Result<Self, CatalogError> {
        if config.api_key.is_empty() {
            return Err(CatalogError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.unwrap_or(15)))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn search_movies(&self, query: &MovieQuery) -> Result<Vec<MovieSummary>, CatalogError> {
        let url = format!("{}/search/movie", self.base_url);

        debug!(
            "TMDB movie search: query='{}', year={:?}, locale={}",
            query.title, query.year, query.locale
        );

        let mut request = self.client.get(&url).query(&[
            ("api_key", self.api_key.as_str()),
            ("language", query.locale.as_str()),
            ("query", query.title.as_str()),
            ("include_adult", "false"),
        ]);

        if let Some(y) = query.year {
            request = request.query(&[("year", &y.to_string())]);
        }

        let response = check_status(request.send().await?, "TMDB movie search").await?;

        let search_result: TmdbSearchResponse<TmdbMovieResult> =
            response.json().await.map_err(|e| {
                CatalogError::ParseError(format!("Failed to parse movie search response: {}", e))
            })?;

        Ok(search_result
            .results
            .into_iter()
            .map(|r| r.into())
            .collect())
    }

    async fn movie_videos(
        &self,
        movie_id: u64,
        query: &VideosQuery,
    ) -> Result<Vec<MovieVideo>, CatalogError> {
        let url = format!("{}/movie/{}/videos", self.base_url, movie_id);

        debug!(
            "TMDB movie videos: id={}, locale={}, video_language={:?}",
            movie_id, query.locale, query.include_video_language
        );

        let mut request = self.client.get(&url).query(&[
            ("api_key", self.api_key.as_str()),
            ("language", query.locale.as_str()),
        ]);

        if let Some(lang) = &query.include_video_language {
            request = request.query(&[("include_video_language", lang.as_str())]);
        }

        let response = check_status(
            request.send().await?,
            &format!("TMDB videos for movie {}", movie_id),
        )
        .await?;

        let videos: TmdbSearchResponse<TmdbVideoResult> = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse videos response: {}", e))
        })?;

        Ok(videos.results.into_iter().map(|r| r.into()).collect())
    }
}

// TMDB API response types

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u64,
    #[serde(default)]
    title: String,
    release_date: Option<String>,
    popularity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TmdbVideoResult {
    #[serde(default)]
    key: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    site: String,
    #[serde(rename = "type", default)]
    video_type: String,
    iso_639_1: Option<String>,
    #[serde(default)]
    official: bool,
    size: Option<u32>,
}

impl From<TmdbMovieResult> for MovieSummary {
    fn from(r: TmdbMovieResult) -> Self {
        Self {
            id: r.id,
            title: r.title,
            release_date: r.release_date.filter(|d| !d.is_empty()),
            popularity: r.popularity.unwrap_or(0.0),
        }
    }
}

impl From<TmdbVideoResult> for MovieVideo {
    fn from(r: TmdbVideoResult) -> Self {
        Self {
            key: r.key,
            name: r.name,
            site: r.site,
            kind: r.video_type,
            language: r.iso_639_1.filter(|l| !l.is_empty()),
            official: r.official,
            size: r.size.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        let result = TmdbClient::new(TmdbConfig::new(""));
        assert!(matches!(result, Err(CatalogError::NotConfigured(_))));
    }

    #[test]
    fn test_movie_search_response_parsing() {
        let json = r#"{
            "page": 1,
            "results": [
                {"id": 27205, "title": "Inception", "release_date": "2010-07-15", "popularity": 83.9},
                {"id": 64956, "title": "Inception: The Cobol Job", "release_date": "", "popularity": null}
            ],
            "total_results": 2
        }"#;

        let parsed: TmdbSearchResponse<TmdbMovieResult> = serde_json::from_str(json).unwrap();
        let movies: Vec<MovieSummary> = parsed.results.into_iter().map(Into::into).collect();

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].id, 27205);
        assert_eq!(movies[0].year(), Some(2010));
        assert_eq!(movies[1].release_date, None);
        assert_eq!(movies[1].popularity, 0.0);
    }

    #[test]
    fn test_videos_response_parsing() {
        let json = r#"{
            "id": 27205,
            "results": [
                {
                    "iso_639_1": "de",
                    "iso_3166_1": "DE",
                    "name": "INCEPTION - Offizieller Trailer",
                    "key": "abcdefghijk",
                    "site": "YouTube",
                    "size": 1080,
                    "type": "Trailer",
                    "official": true
                },
                {
                    "name": "Featurette",
                    "key": "zyxwvutsrqp",
                    "site": "YouTube",
                    "type": "Featurette"
                }
            ]
        }"#;

        let parsed: TmdbSearchResponse<TmdbVideoResult> = serde_json::from_str(json).unwrap();
        let videos: Vec<MovieVideo> = parsed.results.into_iter().map(Into::into).collect();

        assert_eq!(videos[0].language.as_deref(), Some("de"));
        assert_eq!(videos[0].kind, "Trailer");
        assert!(videos[0].official);
        assert!(videos[0].is_youtube_trailer());
        assert_eq!(videos[1].size, 0);
        assert!(!videos[1].official);
        assert!(!videos[1].is_youtube_trailer());
    }

    #[test]
    fn test_empty_body_has_no_results() {
        let parsed: TmdbSearchResponse<TmdbMovieResult> = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());
    }
}
