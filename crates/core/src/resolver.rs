//! Trailer resolution: TMDB first, video-site search as fallback.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::external_catalog::{
    MovieCatalog, MovieQuery, MovieSummary, MovieVideo, VideoSearch, VideoSearchHit,
    VideoSearchQuery, VideosQuery,
};
use crate::language::Language;
use crate::library::TitleGuess;

/// Locale used for the unfiltered TMDB videos lookup.
const FALLBACK_VIDEO_LOCALE: &str = "en-US";
/// Hits requested from the video-site search.
const SEARCH_MAX_RESULTS: u32 = 6;

/// Where a resolved trailer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailerSource {
    Tmdb,
    VideoSearch,
}

/// A trailer video picked for a movie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrailer {
    pub video_id: String,
    /// Language tag reported by TMDB; unknown for search hits.
    pub language: Option<String>,
    pub source: TrailerSource,
}

/// Resolves a title guess to a trailer video id.
///
/// Upstream failures never surface as errors: a failing stage is logged and
/// treated as having no results.
pub struct TrailerResolver {
    catalog: Arc<dyn MovieCatalog>,
    video_search: Option<Arc<dyn VideoSearch>>,
    language: Language,
    strict_language: bool,
    api_delay: Duration,
}

impl TrailerResolver {
    pub fn new(catalog: Arc<dyn MovieCatalog>, language: Language) -> Self {
        Self {
            catalog,
            video_search: None,
            language,
            strict_language: false,
            api_delay: Duration::ZERO,
        }
    }

    /// Enable the video-site search fallback.
    pub fn with_video_search(mut self, search: Arc<dyn VideoSearch>) -> Self {
        self.video_search = Some(search);
        self
    }

    /// Reject TMDB trailers whose language differs from the configured one.
    pub fn with_strict_language(mut self, strict: bool) -> Self {
        self.strict_language = strict;
        self
    }

    /// Pause inserted between consecutive upstream calls.
    pub fn with_api_delay(mut self, delay: Duration) -> Self {
        self.api_delay = delay;
        self
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Full lookup for one movie.
    pub async fn resolve(&self, guess: &TitleGuess) -> Option<ResolvedTrailer> {
        info!(
            "Searching trailer for '{}' ({}) lang={}",
            guess.title,
            guess
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            self.language.code
        );

        let mut resolved = None;
        if let Some(movie_id) = self.find_movie(guess).await {
            self.pause().await;
            resolved = self.tmdb_trailer(movie_id).await;
        }

        if let Some(trailer) = &resolved {
            let language_matches =
                trailer.language.as_deref() == Some(self.language.code.as_str());
            if self.strict_language && !language_matches {
                info!(
                    "TMDB trailer not in requested language ({}), strict mode ignores it",
                    trailer.language.as_deref().unwrap_or("unknown")
                );
                resolved = None;
            }
        }

        if resolved.is_none() {
            resolved = self.search_fallback(guess).await;
        }

        if resolved.is_none() {
            warn!(
                "No trailer found for '{}' in lang={}",
                guess.title, self.language.code
            );
        }
        resolved
    }

    /// TMDB movie search, retried without the year when it comes back empty.
    pub async fn find_movie(&self, guess: &TitleGuess) -> Option<u64> {
        let query = MovieQuery {
            title: guess.title.clone(),
            year: guess.year,
            locale: self.language.tmdb_locale.to_string(),
        };

        let mut results = self.search_movies(&query).await;
        if results.is_empty() && query.year.is_some() {
            debug!("No TMDB match with year, retrying without it");
            self.pause().await;
            results = self.search_movies(&query.without_year()).await;
        }

        let best = best_movie(&results, &guess.title)?;
        debug!("TMDB match: {} (id={})", best.title, best.id);
        Some(best.id)
    }

    /// Best YouTube trailer listed on TMDB for a movie.
    pub async fn tmdb_trailer(&self, movie_id: u64) -> Option<ResolvedTrailer> {
        let code = &self.language.code;

        let filtered = self
            .movie_videos(
                movie_id,
                &VideosQuery {
                    locale: self.language.tmdb_locale.to_string(),
                    include_video_language: Some(code.clone()),
                },
            )
            .await;

        let picked = match preferred_language_trailer(&filtered, code) {
            Some(video) => Some(video.clone()),
            None => {
                self.pause().await;
                let all = self
                    .movie_videos(
                        movie_id,
                        &VideosQuery {
                            locale: FALLBACK_VIDEO_LOCALE.to_string(),
                            include_video_language: None,
                        },
                    )
                    .await;
                any_language_trailer(&all, code).cloned()
            }
        };

        picked.map(|video| ResolvedTrailer {
            video_id: video.key,
            language: video.language,
            source: TrailerSource::Tmdb,
        })
    }

    /// Video-site search; `None` without a configured search client.
    pub async fn search_fallback(&self, guess: &TitleGuess) -> Option<ResolvedTrailer> {
        let Some(search) = &self.video_search else {
            debug!("No video search configured, skipping fallback");
            return None;
        };

        info!("Falling back to YouTube search");
        self.pause().await;

        let query = VideoSearchQuery {
            text: search_text(guess, self.language.native_word),
            relevance_language: self.language.code.clone(),
            region_code: self.language.region.to_string(),
            max_results: SEARCH_MAX_RESULTS,
        };

        let hits = match search.search_videos(&query).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("YouTube search failed: {}", e);
                Vec::new()
            }
        };

        best_search_hit(&hits, self.language.native_word).map(|hit| ResolvedTrailer {
            video_id: hit.video_id.clone(),
            language: None,
            source: TrailerSource::VideoSearch,
        })
    }

    async fn search_movies(&self, query: &MovieQuery) -> Vec<MovieSummary> {
        match self.catalog.search_movies(query).await {
            Ok(results) => results,
            Err(e) => {
                warn!("TMDB search for '{}' failed: {}", query.title, e);
                Vec::new()
            }
        }
    }

    async fn movie_videos(&self, movie_id: u64, query: &VideosQuery) -> Vec<MovieVideo> {
        match self.catalog.movie_videos(movie_id, query).await {
            Ok(videos) => videos,
            Err(e) => {
                warn!("TMDB videos lookup for {} failed: {}", movie_id, e);
                Vec::new()
            }
        }
    }

    async fn pause(&self) {
        if !self.api_delay.is_zero() {
            tokio::time::sleep(self.api_delay).await;
        }
    }
}

/// Lowercased alphanumerics only, for title equality.
pub fn clean_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Query text for the video-site search.
pub fn search_text(guess: &TitleGuess, native_word: &str) -> String {
    match guess.year {
        Some(year) => format!("{} {} Trailer {}", guess.title, year, native_word),
        None => format!("{} Trailer {}", guess.title, native_word),
    }
}

/// Ranks by (exact cleaned title, popularity).
pub fn best_movie<'a>(results: &'a [MovieSummary], title: &str) -> Option<&'a MovieSummary> {
    let target = clean_title(title);
    first_max_by_key(results, |m| (clean_title(&m.title) == target, m.popularity))
}

/// Trailers in the requested language, ranked by (official, "trailer" in name, size).
pub fn preferred_language_trailer<'a>(videos: &'a [MovieVideo], code: &str) -> Option<&'a MovieVideo> {
    let candidates: Vec<&MovieVideo> = videos
        .iter()
        .filter(|v| v.is_youtube_trailer() && v.language.as_deref() == Some(code))
        .collect();
    first_max_by_key(&candidates, |v| {
        (
            v.official,
            v.name.to_lowercase().contains("trailer"),
            v.size,
        )
    })
    .copied()
}

/// Any trailer, ranked by (language match, official, size).
pub fn any_language_trailer<'a>(videos: &'a [MovieVideo], code: &str) -> Option<&'a MovieVideo> {
    let candidates: Vec<&MovieVideo> = videos.iter().filter(|v| v.is_youtube_trailer()).collect();
    first_max_by_key(&candidates, |v| {
        (v.language.as_deref() == Some(code), v.official, v.size)
    })
    .copied()
}

/// Ranks by ("trailer" in title, native word in title, "trailer" in channel, publish date).
pub fn best_search_hit<'a>(hits: &'a [VideoSearchHit], native_word: &str) -> Option<&'a VideoSearchHit> {
    let native = native_word.to_lowercase();
    first_max_by_key(hits, |hit| {
        let title = hit.title.to_lowercase();
        (
            title.contains("trailer"),
            title.contains(&native),
            hit.channel_title.to_lowercase().contains("trailer"),
            hit.published_at,
        )
    })
}

/// Highest key wins; on ties the earliest item is kept.
fn first_max_by_key<T, K: PartialOrd>(items: &[T], key: impl Fn(&T) -> K) -> Option<&T> {
    let mut best: Option<(&T, K)> = None;
    for item in items {
        let k = key(item);
        if best.as_ref().is_none_or(|(_, best_key)| k > *best_key) {
            best = Some((item, k));
        }
    }
    best.map(|(item, _)| item)
}
