//! Error types for the downloader module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running the external downloader.
#[derive(Debug, Error)]
pub enum DownloaderError {
    /// yt-dlp binary not found.
    #[error("yt-dlp not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// The download process failed.
    #[error("Download failed: {message}")]
    Failed {
        message: String,
        stderr: Option<String>,
    },

    /// The download did not finish in time.
    #[error("Download timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The downloader reported success but the output file is missing.
    #[error("Download produced no output at {path}")]
    OutputMissing { path: PathBuf },

    /// I/O error while running the downloader.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloaderError {
    /// Creates a failure error from a message and captured stderr.
    pub fn failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            message: message.into(),
            stderr,
        }
    }

    /// Message plus captured stderr, for matching on failure causes.
    pub fn failure_text(&self) -> String {
        match self {
            Self::Failed {
                message,
                stderr: Some(stderr),
            } => format!("{}\n{}", message, stderr),
            other => other.to_string(),
        }
    }
}
