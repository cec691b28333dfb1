//! Configuration for the yt-dlp downloader.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::ToolsConfig;

/// Configuration for the yt-dlp based downloader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Path to yt-dlp binary.
    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: PathBuf,

    /// Timeout for a single download in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_yt_dlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_timeout() -> u64 {
    900
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: default_yt_dlp_path(),
            timeout_secs: default_timeout(),
        }
    }
}

impl From<&ToolsConfig> for DownloaderConfig {
    fn from(tools: &ToolsConfig) -> Self {
        Self {
            yt_dlp_path: tools.yt_dlp_path.clone(),
            timeout_secs: tools.download_timeout_secs,
        }
    }
}
