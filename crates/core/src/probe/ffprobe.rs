//! FFprobe-based height prober.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use super::{HeightProber, ProbeError};

/// Runs `ffprobe` against the first video stream.
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Extracts the height from `-show_entries stream=height -of json` output.
    fn parse_height(stdout: &str) -> Result<Option<u32>, ProbeError> {
        let output: FfprobeOutput =
            serde_json::from_str(stdout).map_err(|e| ProbeError::ParseError {
                reason: e.to_string(),
            })?;

        Ok(output
            .streams
            .into_iter()
            .find_map(|s| s.height)
            .filter(|h| *h > 0))
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl HeightProber for FfprobeProber {
    async fn probe_height(&self, path: &Path) -> Result<Option<u32>, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=height",
                "-of",
                "json",
            ])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::FfprobeNotFound {
                        path: self.ffprobe_path.clone(),
                    }
                } else {
                    ProbeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ProbeError::ProbeFailed {
                reason: format!(
                    "ffprobe failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let height = Self::parse_height(&String::from_utf8_lossy(&output.stdout))?;
        debug!("Probed {}: height={:?}", path.display(), height);
        Ok(height)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    height: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_height() {
        let json = r#"{"programs": [], "streams": [{"height": 1080}]}"#;
        assert_eq!(FfprobeProber::parse_height(json).unwrap(), Some(1080));
    }

    #[test]
    fn test_parse_no_video_stream() {
        assert_eq!(FfprobeProber::parse_height("{}").unwrap(), None);
        assert_eq!(
            FfprobeProber::parse_height(r#"{"streams": [{}]}"#).unwrap(),
            None
        );
        assert_eq!(
            FfprobeProber::parse_height(r#"{"streams": [{"height": 0}]}"#).unwrap(),
            None
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            FfprobeProber::parse_height("not json"),
            Err(ProbeError::ParseError { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_input() {
        let prober = FfprobeProber::default();
        let result = prober
            .probe_height(Path::new("/nonexistent/trailer.mp4"))
            .await;
        assert!(matches!(result, Err(ProbeError::InputNotFound { .. })));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let prober = FfprobeProber::new("/nonexistent/bin/ffprobe");
        let result = prober.probe_height(temp.path()).await;
        assert!(matches!(result, Err(ProbeError::FfprobeNotFound { .. })));
    }
}
