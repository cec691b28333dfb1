//! Read-only coverage and quality report over the library.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::context::RunContext;
use crate::library::{trailer_candidates, walk_movies, MovieFolder, TitleGuess};
use crate::probe::{describe_height, height_or_unknown, HeightProber};

/// Trailer state of one movie folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailerStatus {
    Missing,
    /// Height unknown or below the preferred height.
    BelowTarget { path: PathBuf, height: Option<u32> },
    Satisfied { path: PathBuf, height: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieStats {
    pub folder: PathBuf,
    pub title: TitleGuess,
    pub status: TrailerStatus,
}

/// Result of a stats pass.
#[derive(Debug, Clone, Default)]
pub struct StatsReport {
    pub roots: Vec<PathBuf>,
    pub language: String,
    pub preferred_height: u32,
    pub movies: Vec<MovieStats>,
    /// Roots or folders that could not be read.
    pub errors: usize,
}

impl StatsReport {
    pub fn total(&self) -> usize {
        self.movies.len()
    }

    pub fn with_trailer(&self) -> usize {
        self.total() - self.missing().count()
    }

    pub fn below_target(&self) -> impl Iterator<Item = &MovieStats> {
        self.movies
            .iter()
            .filter(|m| matches!(m.status, TrailerStatus::BelowTarget { .. }))
    }

    pub fn missing(&self) -> impl Iterator<Item = &MovieStats> {
        self.movies
            .iter()
            .filter(|m| m.status == TrailerStatus::Missing)
    }

    /// Share of movies with a trailer, in percent.
    pub fn coverage_percent(&self) -> f64 {
        if self.movies.is_empty() {
            return 0.0;
        }
        self.with_trailer() as f64 / self.total() as f64 * 100.0
    }

    /// Human readable report; `list_limit` 0 lists everything.
    pub fn render(&self, list_limit: usize) -> String {
        let mut out = String::new();
        let roots: Vec<String> = self.roots.iter().map(|r| r.display().to_string()).collect();

        let _ = writeln!(out);
        let _ = writeln!(out, "=== trailerfetch :: Stats ===");
        let _ = writeln!(out, "Roots: {}", roots.join(", "));
        let _ = writeln!(
            out,
            "Language: {} | Preferred height: {}p",
            self.language, self.preferred_height
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Total movie folders: {}", self.total());
        if self.total() > 0 {
            let _ = writeln!(
                out,
                "Trailers present   : {} ({:.1}% coverage)",
                self.with_trailer(),
                self.coverage_percent()
            );
        } else {
            let _ = writeln!(out, "Trailers present   : 0");
        }
        let below: Vec<&MovieStats> = self.below_target().collect();
        let missing: Vec<&MovieStats> = self.missing().collect();
        let _ = writeln!(out, "Below target height: {}", below.len());
        let _ = writeln!(out, "Completely missing : {}", missing.len());
        let _ = writeln!(out);

        if !below.is_empty() {
            let _ = writeln!(out, "=== Trailers below target height (or unknown) ===");
            let shown = limited(below.len(), list_limit);
            for (i, movie) in below.iter().take(shown).enumerate() {
                if let TrailerStatus::BelowTarget { path, height } = &movie.status {
                    let _ = writeln!(
                        out,
                        "{:>3}. {}  -> {}  [{}]",
                        i + 1,
                        movie.title,
                        describe_height(*height),
                        path.display()
                    );
                }
            }
            more_line(&mut out, below.len(), shown);
            let _ = writeln!(out);
        }

        if missing.is_empty() {
            let _ = writeln!(out, "All movies have at least one trailer.");
        } else {
            let _ = writeln!(out, "=== Movies with no trailer at all ===");
            let shown = limited(missing.len(), list_limit);
            for (i, movie) in missing.iter().take(shown).enumerate() {
                let _ = writeln!(out, "{:>3}. {}", i + 1, movie.title);
            }
            more_line(&mut out, missing.len(), shown);
        }

        out
    }
}

fn limited(len: usize, list_limit: usize) -> usize {
    if list_limit == 0 {
        len
    } else {
        len.min(list_limit)
    }
}

fn more_line(out: &mut String, len: usize, shown: usize) {
    if shown < len {
        let _ = writeln!(out, "... and {} more", len - shown);
    }
}

/// Walks the library and classifies every movie's trailer.
pub struct StatsReporter<'a> {
    ctx: &'a RunContext,
    prober: Arc<dyn HeightProber>,
}

impl<'a> StatsReporter<'a> {
    pub fn new(ctx: &'a RunContext, prober: Arc<dyn HeightProber>) -> Self {
        Self { ctx, prober }
    }

    /// Unreadable roots and folders are logged, counted and left out.
    pub async fn collect(&self) -> StatsReport {
        let settings = &self.ctx.config.settings;
        let roots = self.ctx.config.roots();
        let mut movies = Vec::new();
        let mut errors = 0;

        for root in &roots {
            let dirs = match walk_movies(root).await {
                Ok(dirs) => dirs,
                Err(e) => {
                    warn!("Cannot list {}: {}", root.display(), e);
                    errors += 1;
                    continue;
                }
            };

            for dir in dirs {
                let folder = match MovieFolder::discover(
                    &dir,
                    &settings.video_exts,
                    &settings.trailer_suffix,
                )
                .await
                {
                    Ok(Some(folder)) => folder,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!("Cannot read {}: {}", dir.display(), e);
                        errors += 1;
                        continue;
                    }
                };

                movies.push(MovieStats {
                    title: self.ctx.titles.from_folder_name(&folder.folder_name()),
                    status: self.classify(&folder).await,
                    folder: folder.path,
                });
            }
        }

        StatsReport {
            roots,
            language: self.ctx.language.code.clone(),
            preferred_height: settings.preferred_height,
            movies,
            errors,
        }
    }

    async fn classify(&self, folder: &MovieFolder) -> TrailerStatus {
        // the higher of .mp4/.mkv represents the movie; known beats unknown
        let mut best: Option<(PathBuf, Option<u32>)> = None;
        for path in trailer_candidates(&folder.trailer_target) {
            let height = height_or_unknown(self.prober.as_ref(), &path).await;
            let better = match &best {
                None => true,
                Some((_, current)) => height > *current,
            };
            if better {
                best = Some((path, height));
            }
        }

        match best {
            None => TrailerStatus::Missing,
            Some((path, Some(height))) if height >= self.ctx.config.settings.preferred_height => {
                TrailerStatus::Satisfied { path, height }
            }
            Some((path, height)) => TrailerStatus::BelowTarget { path, height },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(title: &str, year: Option<u32>, status: TrailerStatus) -> MovieStats {
        MovieStats {
            folder: PathBuf::from(format!("/m/{}", title)),
            title: TitleGuess {
                title: title.to_string(),
                year,
            },
            status,
        }
    }

    fn report() -> StatsReport {
        StatsReport {
            roots: vec![PathBuf::from("/m")],
            language: "de".to_string(),
            preferred_height: 1080,
            movies: vec![
                movie(
                    "Heat",
                    Some(1995),
                    TrailerStatus::BelowTarget {
                        path: PathBuf::from("/m/Heat/heat-trailer.mp4"),
                        height: Some(720),
                    },
                ),
                movie(
                    "Alien",
                    None,
                    TrailerStatus::BelowTarget {
                        path: PathBuf::from("/m/Alien/alien-trailer.mkv"),
                        height: None,
                    },
                ),
                movie("Arrival", Some(2016), TrailerStatus::Missing),
                movie(
                    "Inception",
                    Some(2010),
                    TrailerStatus::Satisfied {
                        path: PathBuf::from("/m/Inception/inception-trailer.mp4"),
                        height: 1080,
                    },
                ),
            ],
            errors: 0,
        }
    }

    #[test]
    fn test_counts() {
        let report = report();
        assert_eq!(report.total(), 4);
        assert_eq!(report.with_trailer(), 3);
        assert_eq!(report.below_target().count(), 2);
        assert_eq!(report.missing().count(), 1);
        assert!((report.coverage_percent() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_render_full() {
        let text = report().render(0);
        assert!(text.contains("Roots: /m"));
        assert!(text.contains("Language: de | Preferred height: 1080p"));
        assert!(text.contains("Trailers present   : 3 (75.0% coverage)"));
        assert!(text.contains("  1. Heat (1995)  -> 720p  [/m/Heat/heat-trailer.mp4]"));
        assert!(text.contains("  2. Alien  -> unknown  [/m/Alien/alien-trailer.mkv]"));
        assert!(text.contains("  1. Arrival (2016)"));
        assert!(!text.contains("more"));
        assert!(!text.contains("All movies have at least one trailer."));
    }

    #[test]
    fn test_render_truncates() {
        let text = report().render(1);
        assert!(text.contains("  1. Heat (1995)"));
        assert!(!text.contains("  2. Alien"));
        assert!(text.contains("... and 1 more"));
    }

    #[test]
    fn test_render_empty_library() {
        let text = StatsReport::default().render(0);
        assert!(text.contains("Total movie folders: 0"));
        assert!(text.contains("Trailers present   : 0\n"));
        assert!(text.contains("All movies have at least one trailer."));
    }
}
