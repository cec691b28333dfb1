//! Mock metadata services for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::external_catalog::{
    CatalogError, MovieCatalog, MovieQuery, MovieSummary, MovieVideo, VideoSearch,
    VideoSearchHit, VideoSearchQuery, VideosQuery,
};
use crate::resolver::clean_title;

/// Mock implementation of the MovieCatalog trait.
///
/// Searches match when the cleaned query is contained in the cleaned movie
/// title and, when a year is given, the release year matches. Video lookups
/// honour the `include_video_language` filter.
#[derive(Debug, Clone, Default)]
pub struct MockMovieCatalog {
    movies: Arc<RwLock<Vec<MovieSummary>>>,
    videos: Arc<RwLock<HashMap<u64, Vec<MovieVideo>>>>,
    searches: Arc<RwLock<Vec<MovieQuery>>>,
    video_lookups: Arc<RwLock<Vec<(u64, VideosQuery)>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl MockMovieCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_movie(&self, movie: MovieSummary) {
        self.movies.write().await.push(movie);
    }

    pub async fn add_videos(&self, movie_id: u64, videos: Vec<MovieVideo>) {
        self.videos
            .write()
            .await
            .entry(movie_id)
            .or_default()
            .extend(videos);
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn recorded_searches(&self) -> Vec<MovieQuery> {
        self.searches.read().await.clone()
    }

    pub async fn recorded_video_lookups(&self) -> Vec<(u64, VideosQuery)> {
        self.video_lookups.read().await.clone()
    }

    /// Searches plus video lookups.
    pub async fn request_count(&self) -> usize {
        self.searches.read().await.len() + self.video_lookups.read().await.len()
    }

    async fn take_error(&self) -> Option<CatalogError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl MovieCatalog for MockMovieCatalog {
    async fn search_movies(&self, query: &MovieQuery) -> Result<Vec<MovieSummary>, CatalogError> {
        self.searches.write().await.push(query.clone());
        if let Some(e) = self.take_error().await {
            return Err(e);
        }

        let needle = clean_title(&query.title);
        Ok(self
            .movies
            .read()
            .await
            .iter()
            .filter(|m| clean_title(&m.title).contains(&needle))
            .filter(|m| query.year.is_none() || m.year() == query.year)
            .cloned()
            .collect())
    }

    async fn movie_videos(
        &self,
        movie_id: u64,
        query: &VideosQuery,
    ) -> Result<Vec<MovieVideo>, CatalogError> {
        self.video_lookups
            .write()
            .await
            .push((movie_id, query.clone()));
        if let Some(e) = self.take_error().await {
            return Err(e);
        }

        let videos = self.videos.read().await;
        let Some(list) = videos.get(&movie_id) else {
            return Err(CatalogError::NotFound(format!("Movie ID {}", movie_id)));
        };
        Ok(list
            .iter()
            .filter(|v| match &query.include_video_language {
                Some(lang) => v.language.as_deref() == Some(lang.as_str()),
                None => true,
            })
            .cloned()
            .collect())
    }
}

/// Mock implementation of the VideoSearch trait. Returns every configured hit.
#[derive(Debug, Clone, Default)]
pub struct MockVideoSearch {
    hits: Arc<RwLock<Vec<VideoSearchHit>>>,
    queries: Arc<RwLock<Vec<VideoSearchQuery>>>,
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl MockVideoSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_hit(&self, hit: VideoSearchHit) {
        self.hits.write().await.push(hit);
    }

    /// Configure the next search to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn recorded_queries(&self) -> Vec<VideoSearchQuery> {
        self.queries.read().await.clone()
    }
}

#[async_trait]
impl VideoSearch for MockVideoSearch {
    async fn search_videos(
        &self,
        query: &VideoSearchQuery,
    ) -> Result<Vec<VideoSearchHit>, CatalogError> {
        self.queries.write().await.push(query.clone());
        if let Some(e) = self.next_error.write().await.take() {
            return Err(e);
        }
        Ok(self.hits.read().await.clone())
    }
}
