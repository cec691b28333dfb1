//! Download & quality-upgrade engine.
//!
//! Runs the downloader through an ordered list of strategies, probes every
//! file it produces and keeps a candidate only when it is strictly better than
//! the trailer already on disk.
//!
//! # Example
//!
//! ```ignore
//! use trailerfetch_core::engine::{UpgradeEngine, UpgradeRequest};
//!
//! let engine = UpgradeEngine::new(downloader, prober);
//! let report = engine
//!     .upgrade_trailer(&UpgradeRequest {
//!         target_path: "/movies/Inception (2010)/inception-trailer.mp4".into(),
//!         video_id: "YoHD9XEInc0".to_string(),
//!         preferred_height: 1080,
//!         temp_dir: "/tmp/trailerfetch".into(),
//!         allow_non_mp4: true,
//!         existing_height: None,
//!     })
//!     .await;
//! assert!(report.succeeded());
//! ```

mod replacement;
mod strategy;

pub use replacement::{consider_replacement, is_improvement, CurrentTrailer, ReplacementDecision};
pub use strategy::{
    default_strategies, is_fragment_403, Applicability, PassState, Strategy, StrategyKind,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::downloader::{watch_url, Container, DownloadRequest, DownloaderError, VideoDownloader};
use crate::library::{
    fallback_trailer_path, locate_existing_trailer, primary_trailer_path, trailer_candidates,
};
use crate::placer::{cleanup_temp, remove_if_empty};
use crate::probe::{describe_height, height_or_unknown, HeightProber};

const DOWNLOAD_RETRIES: u32 = 10;

/// Inputs of one upgrade run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeRequest {
    /// Canonical `.mp4` target next to the movie.
    pub target_path: PathBuf,
    pub video_id: String,
    pub preferred_height: u32,
    pub temp_dir: PathBuf,
    /// Enables the any-codec MKV pass.
    pub allow_non_mp4: bool,
    /// Probed height of the trailer already on disk, if any.
    pub existing_height: Option<u32>,
}

/// How one attempted pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The candidate replaced the trailer on disk.
    Placed { height: Option<u32> },
    /// The candidate was not better and got deleted.
    Discarded { height: Option<u32> },
    /// The pass produced nothing usable.
    Failed { reason: String },
}

/// Record of one strategy execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadAttempt {
    pub strategy: StrategyKind,
    pub format: String,
    pub container: Container,
    pub temp_path: PathBuf,
    pub outcome: AttemptOutcome,
}

/// What an upgrade run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeReport {
    pub attempts: Vec<DownloadAttempt>,
    /// Trailer on disk after the run.
    pub final_path: Option<PathBuf>,
    pub final_height: Option<u32>,
}

impl UpgradeReport {
    /// A trailer exists once the run is over.
    pub fn succeeded(&self) -> bool {
        self.final_path.is_some()
    }

    /// Some pass put a new file in place.
    pub fn placed_new(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| matches!(a.outcome, AttemptOutcome::Placed { .. }))
    }

    /// Every attempted pass failed.
    pub fn all_failed(&self) -> bool {
        self.attempts
            .iter()
            .all(|a| matches!(a.outcome, AttemptOutcome::Failed { .. }))
    }
}

/// Drives the strategy list for one trailer.
pub struct UpgradeEngine {
    downloader: Arc<dyn VideoDownloader>,
    prober: Arc<dyn HeightProber>,
    strategies: Vec<Strategy>,
    geo_bypass_country: Option<String>,
}

impl UpgradeEngine {
    pub fn new(downloader: Arc<dyn VideoDownloader>, prober: Arc<dyn HeightProber>) -> Self {
        Self {
            downloader,
            prober,
            strategies: default_strategies(),
            geo_bypass_country: None,
        }
    }

    /// Country passed to the downloader's geo bypass.
    pub fn with_geo_bypass_country(mut self, country: impl Into<String>) -> Self {
        self.geo_bypass_country = Some(country.into());
        self
    }

    pub fn prober(&self) -> &Arc<dyn HeightProber> {
        &self.prober
    }

    /// Downloads `video_id` and keeps it only if it beats the trailer on disk.
    pub async fn upgrade_trailer(&self, request: &UpgradeRequest) -> UpgradeReport {
        let target = primary_trailer_path(&request.target_path);
        let temp_dir = scratch_dir(&request.temp_dir, &target);
        let mut report = UpgradeReport::default();

        if let Err(e) = fs::create_dir_all(&temp_dir).await {
            warn!("Cannot create temp dir {}: {}", temp_dir.display(), e);
            return self.finish(report, &target, request.existing_height).await;
        }

        // an empty file is not a trailer
        for candidate in trailer_candidates(&target) {
            if remove_if_empty(&candidate).await {
                info!("Removed empty trailer {}", candidate.display());
            }
        }

        let mut current = locate_existing_trailer(&target).map(|path| CurrentTrailer {
            path,
            height: request.existing_height,
        });
        let mut state = PassState {
            trailer_exists: current.is_some(),
            current_height: request.existing_height,
            preferred_height: request.preferred_height,
            allow_non_mp4: request.allow_non_mp4,
            ..Default::default()
        };

        let url = watch_url(&request.video_id);
        info!(
            "Downloading trailer from {} with {} (target={}p)",
            url,
            self.downloader.name(),
            request.preferred_height
        );

        for strategy in &self.strategies {
            if !state.applies(strategy.applicability) {
                debug!("Skipping {}", strategy.kind);
                continue;
            }
            info!("Trying {}", strategy.kind);

            let destination = match strategy.container {
                Container::Mp4 => target.clone(),
                Container::Mkv => fallback_trailer_path(&target),
            };
            let temp_path = temp_path_for(&temp_dir, &destination);
            let format = strategy.format(request.preferred_height);

            if strategy.container == Container::Mkv {
                current = self.resolve_current(&target).await;
            }

            let result = self
                .run_pass(strategy, &url, &format, &temp_path, &temp_dir, request)
                .await;

            let outcome = match result {
                Ok(height) => {
                    info!("{} result height: {}", strategy.kind, describe_height(height));
                    match consider_replacement(&temp_path, height, current.as_ref(), &destination)
                        .await
                    {
                        Ok(ReplacementDecision::Replaced { path, height }) => {
                            current = Some(CurrentTrailer { path, height });
                            AttemptOutcome::Placed { height }
                        }
                        Ok(ReplacementDecision::Discarded { .. }) => {
                            AttemptOutcome::Discarded { height }
                        }
                        Err(e) => {
                            warn!("{} could not place trailer: {}", strategy.kind, e);
                            AttemptOutcome::Failed {
                                reason: e.to_string(),
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("{} failed: {}", strategy.kind, e);
                    cleanup_temp(&temp_path).await;
                    if strategy.kind == StrategyKind::Mp4First {
                        state.mp4_failure = Some(e.failure_text());
                    }
                    AttemptOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };

            if !matches!(outcome, AttemptOutcome::Failed { .. }) {
                state.decided = true;
            }
            current = current.filter(|c| c.path.is_file());
            state.trailer_exists = current.is_some();
            state.current_height = current.as_ref().and_then(|c| c.height);

            report.attempts.push(DownloadAttempt {
                strategy: strategy.kind,
                format,
                container: strategy.container,
                temp_path,
                outcome,
            });
        }

        if temp_dir != request.temp_dir {
            // only succeeds when empty
            let _ = fs::remove_dir(&temp_dir).await;
        }

        let known_height = current.as_ref().and_then(|c| c.height);
        self.finish(report, &target, known_height).await
    }

    /// Removes the temp outputs of an abandoned run for `target_path`.
    pub async fn discard_temp(&self, target_path: &Path, temp_dir: &Path) {
        let target = primary_trailer_path(target_path);
        let scratch = scratch_dir(temp_dir, &target);
        for destination in [target.clone(), fallback_trailer_path(&target)] {
            cleanup_temp(&temp_path_for(&scratch, &destination)).await;
        }
        if scratch != temp_dir {
            let _ = fs::remove_dir(&scratch).await;
        }
    }

    /// One downloader invocation; yields the probed height of the output.
    async fn run_pass(
        &self,
        strategy: &Strategy,
        url: &str,
        format: &str,
        temp_path: &Path,
        temp_dir: &Path,
        request: &UpgradeRequest,
    ) -> Result<Option<u32>, DownloaderError> {
        // stale leftovers of an earlier run
        cleanup_temp(temp_path).await;

        let download = DownloadRequest {
            url: url.to_string(),
            output_path: temp_path.to_path_buf(),
            temp_dir: temp_dir.to_path_buf(),
            format: format.to_string(),
            format_sort: strategy.format_sort(request.preferred_height),
            container: strategy.container,
            player_clients: strategy
                .player_clients
                .iter()
                .map(|c| c.to_string())
                .collect(),
            include_manifests: strategy.include_manifests,
            retries: DOWNLOAD_RETRIES,
            fragment_retries: DOWNLOAD_RETRIES,
            geo_bypass_country: self.geo_bypass_country.clone(),
            label: strategy.kind.label().to_string(),
        };

        let outcome = self.downloader.download(&download).await?;
        if !temp_path.is_file() {
            return Err(DownloaderError::OutputMissing {
                path: temp_path.to_path_buf(),
            });
        }
        debug!(
            "{} reported {:?} {:?}/{:?}",
            strategy.kind, outcome.height, outcome.vcodec, outcome.acodec
        );

        Ok(height_or_unknown(self.prober.as_ref(), temp_path).await)
    }

    /// The authoritative trailer on disk, freshly probed.
    async fn resolve_current(&self, target: &Path) -> Option<CurrentTrailer> {
        let path = locate_existing_trailer(target)?;
        let height = height_or_unknown(self.prober.as_ref(), &path).await;
        Some(CurrentTrailer { path, height })
    }

    async fn finish(
        &self,
        mut report: UpgradeReport,
        target: &Path,
        known_height: Option<u32>,
    ) -> UpgradeReport {
        report.final_path = locate_existing_trailer(target);
        report.final_height = match &report.final_path {
            Some(_) if known_height.is_some() => known_height,
            Some(path) => height_or_unknown(self.prober.as_ref(), path).await,
            None => None,
        };

        match &report.final_path {
            Some(path) => info!(
                "Trailer in place: {} ({})",
                path.display(),
                describe_height(report.final_height)
            ),
            None => warn!("No trailer in place for {}", target.display()),
        }
        report
    }
}

/// `<temp_dir>/<destination file name>`
fn temp_path_for(temp_dir: &Path, destination: &Path) -> PathBuf {
    match destination.file_name() {
        Some(name) => temp_dir.join(name),
        None => temp_dir.join("trailer"),
    }
}

/// Keeps temp files out of the movie folder itself.
fn scratch_dir(temp_dir: &Path, target: &Path) -> PathBuf {
    if target.parent() == Some(temp_dir) {
        temp_dir.join(".trailerfetch-tmp")
    } else {
        temp_dir.to_path_buf()
    }
}
