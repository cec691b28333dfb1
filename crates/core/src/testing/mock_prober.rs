//! Mock prober for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;

use crate::probe::{HeightProber, ProbeError};

/// Mock implementation of the HeightProber trait.
///
/// Reads the `height=N` marker written by [`super::MockDownloader`] and
/// [`super::fixtures::write_trailer`]; anything else probes as unknown.
#[derive(Debug, Clone, Default)]
pub struct MockProber {
    overrides: Arc<RwLock<HashMap<PathBuf, Option<u32>>>>,
    probed: Arc<RwLock<Vec<PathBuf>>>,
}

impl MockProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the result for a specific path.
    pub async fn set_height(&self, path: impl AsRef<Path>, height: Option<u32>) {
        self.overrides
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), height);
    }

    /// Paths probed so far, in order.
    pub async fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed.read().await.clone()
    }
}

#[async_trait]
impl HeightProber for MockProber {
    async fn probe_height(&self, path: &Path) -> Result<Option<u32>, ProbeError> {
        self.probed.write().await.push(path.to_path_buf());

        if let Some(height) = self.overrides.read().await.get(path) {
            return Ok(*height);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProbeError::InputNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ProbeError::Io(e)
            }
        })?;

        Ok(content
            .trim()
            .strip_prefix("height=")
            .and_then(|h| h.parse().ok()))
    }
}
