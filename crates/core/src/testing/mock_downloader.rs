//! Mock downloader for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;

use crate::downloader::{DownloadOutcome, DownloadRequest, DownloaderError, VideoDownloader};

/// What the mock does for one download call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedDownload {
    /// Writes a fake video whose height [`super::MockProber`] will report.
    Produce { height: Option<u32> },
    /// Leaves a `.part` leftover and fails with this message.
    Fail { message: String },
}

impl ScriptedDownload {
    pub fn produce(height: u32) -> Self {
        Self::Produce {
            height: Some(height),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail {
            message: message.into(),
        }
    }
}

/// Mock implementation of the VideoDownloader trait.
///
/// Plays back a script, one entry per call. Once the script runs out every
/// call fails.
///
/// # Example
///
/// ```rust,ignore
/// use trailerfetch_core::testing::{MockDownloader, ScriptedDownload};
///
/// let downloader = MockDownloader::new();
/// downloader.push(ScriptedDownload::fail("HTTP Error 403: Forbidden")).await;
/// downloader.push(ScriptedDownload::produce(720)).await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockDownloader {
    script: Arc<RwLock<VecDeque<ScriptedDownload>>>,
    requests: Arc<RwLock<Vec<DownloadRequest>>>,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one scripted result.
    pub async fn push(&self, step: ScriptedDownload) {
        self.script.write().await.push_back(step);
    }

    /// Append several scripted results.
    pub async fn push_all(&self, steps: impl IntoIterator<Item = ScriptedDownload>) {
        self.script.write().await.extend(steps);
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<DownloadRequest> {
        self.requests.read().await.clone()
    }

    /// Get the number of downloads attempted.
    pub async fn download_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

/// Content of a fake video file of the given height.
pub fn fake_video(height: Option<u32>) -> String {
    match height {
        Some(h) => format!("height={}", h),
        None => "height=unknown".to_string(),
    }
}

#[async_trait]
impl VideoDownloader for MockDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(&self, request: &DownloadRequest) -> Result<DownloadOutcome, DownloaderError> {
        self.requests.write().await.push(request.clone());
        let step = self.script.write().await.pop_front();

        if let Some(parent) = request.output_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        match step {
            Some(ScriptedDownload::Produce { height }) => {
                fs::write(&request.output_path, fake_video(height)).await?;
                Ok(DownloadOutcome {
                    height,
                    ext: Some(request.container.extension().to_string()),
                    filepath: Some(request.output_path.clone()),
                    ..Default::default()
                })
            }
            Some(ScriptedDownload::Fail { message }) => {
                let mut part = request.output_path.clone().into_os_string();
                part.push(".part");
                fs::write(&part, b"partial").await?;
                Err(DownloaderError::failed(message.clone(), Some(message)))
            }
            None => Err(DownloaderError::failed("no scripted download left", None)),
        }
    }
}
