//! Types shared by the metadata clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Video hosting site the downloader understands.
pub const YOUTUBE_SITE: &str = "YouTube";
/// TMDB video type for trailers.
pub const TRAILER_TYPE: &str = "Trailer";

/// Movie search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieQuery {
    pub title: String,
    pub year: Option<u32>,
    /// TMDB locale for localized titles, e.g. "de-DE".
    pub locale: String,
}

impl MovieQuery {
    /// The same query without the year filter.
    pub fn without_year(&self) -> Self {
        Self {
            year: None,
            ..self.clone()
        }
    }
}

/// Movie videos lookup parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideosQuery {
    /// TMDB locale, e.g. "de-DE".
    pub locale: String,
    /// Restrict results to this ISO 639-1 video language.
    pub include_video_language: Option<String>,
}

/// One movie search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub popularity: f64,
}

impl MovieSummary {
    /// Get the release year from the release date.
    pub fn year(&self) -> Option<u32> {
        self.release_date
            .as_ref()
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok())
    }
}

/// A video attached to a movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieVideo {
    /// Site-specific video id (the YouTube id for YouTube videos).
    pub key: String,
    pub name: String,
    pub site: String,
    /// "Trailer", "Teaser", "Clip", ...
    pub kind: String,
    /// ISO 639-1 language of the video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub official: bool,
    /// Nominal vertical resolution (360, 720, 1080, ...).
    #[serde(default)]
    pub size: u32,
}

impl MovieVideo {
    /// A trailer hosted on YouTube.
    pub fn is_youtube_trailer(&self) -> bool {
        self.site == YOUTUBE_SITE && self.kind == TRAILER_TYPE
    }
}

/// Video search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSearchQuery {
    pub text: String,
    pub relevance_language: String,
    pub region_code: String,
    pub max_results: u32,
}

/// One video search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSearchHit {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}
