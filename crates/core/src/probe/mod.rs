//! Reading the pixel height of a video file.

mod ffprobe;

pub use ffprobe::FfprobeProber;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur while probing a file.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The probe process exited with a failure.
    #[error("Probe failed: {reason}")]
    ProbeFailed { reason: String },

    /// Failed to parse FFprobe output.
    #[error("Failed to parse probe output: {reason}")]
    ParseError { reason: String },

    /// I/O error while running the prober.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads the vertical resolution of the first video stream.
#[async_trait]
pub trait HeightProber: Send + Sync {
    /// `Ok(None)` when the file has no video stream with a known height.
    async fn probe_height(&self, path: &Path) -> Result<Option<u32>, ProbeError>;
}

/// Probes `path`, logging and folding any failure into "unknown".
pub async fn height_or_unknown(prober: &dyn HeightProber, path: &Path) -> Option<u32> {
    match prober.probe_height(path).await {
        Ok(height) => height,
        Err(e) => {
            warn!("Could not probe {}: {}", path.display(), e);
            None
        }
    }
}

/// "1080p", or "unknown" when the height is not known.
pub fn describe_height(height: Option<u32>) -> String {
    match height {
        Some(h) => format!("{}p", h),
        None => "unknown".to_string(),
    }
}
