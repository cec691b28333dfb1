//! Trait definitions for the downloader module.

use async_trait::async_trait;

use super::error::DownloaderError;
use super::types::{DownloadOutcome, DownloadRequest};

/// Fetches a remote video into a local file.
#[async_trait]
pub trait VideoDownloader: Send + Sync {
    /// Returns the name of this downloader implementation.
    fn name(&self) -> &str;

    /// Runs one download. On success `request.output_path` exists.
    async fn download(&self, request: &DownloadRequest) -> Result<DownloadOutcome, DownloaderError>;
}
