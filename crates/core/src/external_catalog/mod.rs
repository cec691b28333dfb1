//! Metadata lookups against TMDB and YouTube search.
//!
//! Both services are reached through narrow traits so the resolver can be
//! driven by mocks in tests.

mod tmdb;
mod types;
mod youtube;

pub use tmdb::{TmdbClient, TmdbConfig};
pub use types::*;
pub use youtube::{YouTubeSearchClient, YouTubeSearchConfig};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to a metadata service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing or rejected API key).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// Movie metadata service (TMDB).
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Search movies by title, optionally narrowed to a release year.
    async fn search_movies(&self, query: &MovieQuery) -> Result<Vec<MovieSummary>, CatalogError>;

    /// List the videos attached to a movie.
    async fn movie_videos(
        &self,
        movie_id: u64,
        query: &VideosQuery,
    ) -> Result<Vec<MovieVideo>, CatalogError>;
}

/// Free-text video search (YouTube Data API).
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search_videos(
        &self,
        query: &VideoSearchQuery,
    ) -> Result<Vec<VideoSearchHit>, CatalogError>;
}

/// Maps a non-success status onto a [`CatalogError`].
pub(crate) async fn check_status(
    response: reqwest::Response,
    what: &str,
) -> Result<reqwest::Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        401 | 403 => Err(CatalogError::NotConfigured(format!(
            "{} rejected the API key",
            what
        ))),
        404 => Err(CatalogError::NotFound(what.to_string())),
        429 => Err(CatalogError::RateLimitExceeded),
        code => {
            let body = response.text().await.unwrap_or_default();
            Err(CatalogError::ApiError {
                status: code,
                message: body,
            })
        }
    }
}
