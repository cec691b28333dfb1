//! Batch mode: every movie folder under every configured root.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::context::RunContext;
use crate::engine::UpgradeEngine;
use crate::library::{locate_existing_trailer, trailer_candidates, walk_movies, MovieFolder};
use crate::placer::remove_if_empty;
use crate::probe::{describe_height, height_or_unknown};
use crate::resolver::TrailerResolver;

/// What happened to one movie folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOutcome {
    /// No recognised video file in the folder.
    NoMovieFile,
    /// The existing trailer is good enough; nothing was requested upstream.
    Skipped { path: PathBuf, height: Option<u32> },
    /// No trailer video could be resolved.
    NotFound,
    /// A new trailer was placed.
    Saved { path: PathBuf, height: Option<u32> },
    /// Downloads ran but the existing trailer stayed.
    Kept { path: PathBuf, height: Option<u32> },
    /// Every download pass failed and no trailer exists.
    Failed,
}

/// Counters for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Folders with a movie file.
    pub processed: usize,
    pub saved: usize,
    pub kept: usize,
    pub skipped: usize,
    pub not_found: usize,
    pub failed: usize,
    /// Folders that raised an error.
    pub errors: usize,
    /// The run was cut short by the shutdown signal.
    pub interrupted: bool,
}

impl BatchSummary {
    fn record(&mut self, outcome: &FolderOutcome) {
        if *outcome == FolderOutcome::NoMovieFile {
            return;
        }
        self.processed += 1;
        match outcome {
            FolderOutcome::Skipped { .. } => self.skipped += 1,
            FolderOutcome::NotFound => self.not_found += 1,
            FolderOutcome::Saved { .. } => self.saved += 1,
            FolderOutcome::Kept { .. } => self.kept += 1,
            FolderOutcome::Failed => self.failed += 1,
            FolderOutcome::NoMovieFile => {}
        }
    }
}

/// Resolves and downloads trailers for a whole library.
pub struct BatchRunner<'a> {
    ctx: &'a RunContext,
    resolver: TrailerResolver,
    engine: UpgradeEngine,
}

impl<'a> BatchRunner<'a> {
    pub fn new(ctx: &'a RunContext, resolver: TrailerResolver, engine: UpgradeEngine) -> Self {
        Self {
            ctx,
            resolver,
            engine,
        }
    }

    /// Walks all roots in order until done or until `shutdown` resolves.
    ///
    /// On shutdown the in-flight folder is abandoned, which also kills a
    /// running downloader.
    pub async fn run<F>(&self, shutdown: F) -> BatchSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = BatchSummary::default();
        let delay = self.ctx.config.settings.api_delay();

        'roots: for root in self.ctx.config.roots() {
            let dirs = match walk_movies(&root).await {
                Ok(dirs) => dirs,
                Err(e) => {
                    warn!("Cannot list {}: {}", root.display(), e);
                    summary.errors += 1;
                    continue;
                }
            };

            for dir in dirs {
                let result = tokio::select! {
                    biased;
                    _ = &mut shutdown => {
                        info!("Interrupted by user.");
                        self.discard_temp_for(&dir).await;
                        summary.interrupted = true;
                        break 'roots;
                    }
                    result = self.process_movie_dir(&dir) => result,
                };

                let contacted_upstream = match result {
                    Ok(outcome) => {
                        summary.record(&outcome);
                        !matches!(
                            outcome,
                            FolderOutcome::NoMovieFile | FolderOutcome::Skipped { .. }
                        )
                    }
                    Err(e) => {
                        warn!("Error in '{}': {}", dir.display(), e);
                        summary.errors += 1;
                        false
                    }
                };

                if contacted_upstream && !delay.is_zero() {
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => {
                            info!("Interrupted by user.");
                            summary.interrupted = true;
                            break 'roots;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!(
            "Done: processed={} saved={} kept={} skipped={} not_found={} failed={} errors={}",
            summary.processed,
            summary.saved,
            summary.kept,
            summary.skipped,
            summary.not_found,
            summary.failed,
            summary.errors
        );
        summary
    }

    /// Drops the temp outputs of a folder whose download was abandoned.
    async fn discard_temp_for(&self, dir: &Path) {
        let settings = &self.ctx.config.settings;
        if let Ok(Some(folder)) =
            MovieFolder::discover(dir, &settings.video_exts, &settings.trailer_suffix).await
        {
            self.engine
                .discard_temp(&folder.trailer_target, &settings.temp_dir)
                .await;
        }
    }

    /// Handles one movie folder end to end.
    pub async fn process_movie_dir(&self, dir: &Path) -> io::Result<FolderOutcome> {
        let settings = &self.ctx.config.settings;
        let Some(folder) =
            MovieFolder::discover(dir, &settings.video_exts, &settings.trailer_suffix).await?
        else {
            debug!("No movie file in {}", dir.display());
            return Ok(FolderOutcome::NoMovieFile);
        };
        let target = &folder.trailer_target;

        for candidate in trailer_candidates(target) {
            if remove_if_empty(&candidate).await {
                info!("Removed empty trailer {}", candidate.display());
            }
        }

        let mut existing_height = None;
        if let Some(existing) = locate_existing_trailer(target) {
            if !settings.upgrade_existing {
                info!("Trailer exists, skipping: {}", existing.display());
                return Ok(FolderOutcome::Skipped {
                    path: existing,
                    height: None,
                });
            } else {
                existing_height = height_or_unknown(self.engine.prober().as_ref(), &existing).await;
                if existing_height.is_some_and(|h| h >= settings.preferred_height) {
                    info!(
                        "Trailer exists with sufficient quality ({}), skipping: {}",
                        describe_height(existing_height),
                        existing.display()
                    );
                    return Ok(FolderOutcome::Skipped {
                        path: existing,
                        height: existing_height,
                    });
                }
                info!(
                    "Trailer exists at {}, looking for a better one: {}",
                    describe_height(existing_height),
                    existing.display()
                );
            }
        }

        let guess = self
            .ctx
            .titles
            .extract(&folder.folder_name(), &folder.movie_file.file_name);
        if guess.is_degenerate() {
            warn!("Could not infer a title for {}", dir.display());
            return Ok(FolderOutcome::NotFound);
        }

        let Some(trailer) = self.resolver.resolve(&guess).await else {
            return Ok(FolderOutcome::NotFound);
        };

        let request = self
            .ctx
            .upgrade_request(target, &trailer.video_id, existing_height);
        let report = self.engine.upgrade_trailer(&request).await;

        let placed_new = report.placed_new();
        Ok(match report.final_path {
            Some(path) if placed_new => {
                info!("Saved trailer: {}", path.display());
                FolderOutcome::Saved {
                    path,
                    height: report.final_height,
                }
            }
            Some(path) => {
                info!("Kept existing trailer: {}", path.display());
                FolderOutcome::Kept {
                    path,
                    height: report.final_height,
                }
            }
            None => {
                remove_if_empty(target).await;
                warn!("Download failed for '{}'", guess.title);
                FolderOutcome::Failed
            }
        })
    }
}
