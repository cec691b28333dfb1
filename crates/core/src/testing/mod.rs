//! Testing utilities and mock implementations of the external collaborators.
//!
//! The mocks stand in for TMDB, the video-site search, yt-dlp and ffprobe, so
//! the resolver, the upgrade engine and the batch runner can be exercised
//! against a temporary directory without network access or binaries.
//!
//! # Example
//!
//! ```rust,ignore
//! use trailerfetch_core::testing::{MockDownloader, MockProber, ScriptedDownload};
//!
//! let downloader = MockDownloader::new();
//! downloader.push(ScriptedDownload::produce(1080)).await;
//! let prober = MockProber::new();
//!
//! // Hand both to an UpgradeEngine...
//! ```

mod mock_catalog;
mod mock_downloader;
mod mock_prober;

pub use mock_catalog::{MockMovieCatalog, MockVideoSearch};
pub use mock_downloader::{fake_video, MockDownloader, ScriptedDownload};
pub use mock_prober::MockProber;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Utc};
    use std::path::{Path, PathBuf};

    use super::fake_video;
    use crate::external_catalog::{MovieSummary, MovieVideo, VideoSearchHit, YOUTUBE_SITE};

    /// Create a TMDB search result.
    pub fn movie(id: u64, title: &str, year: Option<u32>, popularity: f64) -> MovieSummary {
        MovieSummary {
            id,
            title: title.to_string(),
            release_date: year.map(|y| format!("{}-06-01", y)),
            popularity,
        }
    }

    /// Create a YouTube-hosted TMDB video.
    pub fn video(
        key: &str,
        name: &str,
        language: &str,
        official: bool,
        size: u32,
        kind: &str,
    ) -> MovieVideo {
        MovieVideo {
            key: key.to_string(),
            name: name.to_string(),
            site: YOUTUBE_SITE.to_string(),
            kind: kind.to_string(),
            language: Some(language.to_string()),
            official,
            size,
        }
    }

    /// Create a video search hit. `published_at` is RFC 3339.
    pub fn search_hit(
        video_id: &str,
        title: &str,
        channel_title: &str,
        published_at: &str,
    ) -> VideoSearchHit {
        VideoSearchHit {
            video_id: video_id.to_string(),
            title: title.to_string(),
            channel_title: channel_title.to_string(),
            published_at: DateTime::parse_from_rfc3339(published_at)
                .ok()
                .map(|d| d.with_timezone(&Utc)),
        }
    }

    /// Create `<root>/<folder>/<file_name>` with `size` bytes and return the
    /// movie folder.
    pub fn movie_folder(root: &Path, folder: &str, file_name: &str, size: usize) -> PathBuf {
        let dir = root.join(folder);
        std::fs::create_dir_all(&dir).expect("create movie folder");
        std::fs::write(dir.join(file_name), vec![0u8; size]).expect("write movie file");
        dir
    }

    /// Write a fake trailer that [`super::MockProber`] reports at `height`.
    pub fn write_trailer(path: &Path, height: Option<u32>) {
        std::fs::write(path, fake_video(height)).expect("write trailer");
    }

    /// Names of all entries in `dir`, sorted.
    pub fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}
