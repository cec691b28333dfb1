//! Types describing one downloader invocation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Container the downloader merges/remuxes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Mkv,
}

impl Container {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Mkv => "mkv",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Declarative options bundle for one download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    /// Final output file the downloader writes.
    pub output_path: PathBuf,
    /// Scratch directory for fragments and intermediate files.
    pub temp_dir: PathBuf,
    /// Format selection expression.
    pub format: String,
    /// Format ranking keys, most significant first.
    pub format_sort: Vec<String>,
    pub container: Container,
    /// YouTube player clients to try, in order.
    pub player_clients: Vec<String>,
    /// Whether DASH/HLS manifests are considered.
    pub include_manifests: bool,
    pub retries: u32,
    pub fragment_retries: u32,
    pub geo_bypass_country: Option<String>,
    /// Human-readable pass name for logs.
    pub label: String,
}

/// What the downloader reports about the file it produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DownloadOutcome {
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub filepath: Option<PathBuf>,
}

/// Watch URL for a YouTube video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_extension() {
        assert_eq!(Container::Mp4.extension(), "mp4");
        assert_eq!(Container::Mkv.to_string(), "mkv");
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(
            watch_url("YoHD9XEInc0"),
            "https://www.youtube.com/watch?v=YoHD9XEInc0"
        );
    }
}
