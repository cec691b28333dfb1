//! Movie folder discovery and trailer path conventions.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Container of the canonical trailer target.
pub const TRAILER_TARGET_EXT: &str = "mp4";
/// Container of the quality-preserving fallback trailer.
pub const TRAILER_FALLBACK_EXT: &str = "mkv";

/// The main video file of a movie folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieFile {
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// A movie folder together with its main file and trailer target.
#[derive(Debug, Clone)]
pub struct MovieFolder {
    pub path: PathBuf,
    pub movie_file: MovieFile,
    /// Always the `.mp4` target, even when an `.mkv` trailer ends up on disk.
    pub trailer_target: PathBuf,
}

impl MovieFolder {
    /// Inspects `dir`; `None` when it holds no recognised video file.
    pub async fn discover(
        dir: &Path,
        video_exts: &BTreeSet<String>,
        trailer_suffix: &str,
    ) -> io::Result<Option<Self>> {
        let Some(movie_file) = first_movie_file(dir, video_exts).await? else {
            return Ok(None);
        };
        let trailer_target = build_trailer_target_path(dir, &movie_file.file_name, trailer_suffix);

        Ok(Some(Self {
            path: dir.to_path_buf(),
            movie_file,
            trailer_target,
        }))
    }

    /// Last path component, used for title extraction.
    pub fn folder_name(&self) -> String {
        folder_name(&self.path)
    }
}

pub fn folder_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.to_string_lossy().into_owned())
}

/// Picks the largest regular file in `dir` whose extension (case-insensitive)
/// is in `video_exts`. Ties resolve in directory listing order.
pub async fn first_movie_file(
    dir: &Path,
    video_exts: &BTreeSet<String>,
) -> io::Result<Option<MovieFile>> {
    if video_exts.is_empty() {
        return Ok(None);
    }

    let mut best: Option<MovieFile> = None;
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !has_video_ext(&path, video_exts) {
            continue;
        }
        let meta = match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta,
            _ => continue,
        };

        if best.as_ref().is_none_or(|b| meta.len() > b.size_bytes) {
            best = Some(MovieFile {
                file_name: entry.file_name().to_string_lossy().into_owned(),
                path,
                size_bytes: meta.len(),
            });
        }
    }

    Ok(best)
}

fn has_video_ext(path: &Path, video_exts: &BTreeSet<String>) -> bool {
    path.extension()
        .map(|ext| video_exts.contains(&ext.to_string_lossy().to_lowercase()))
        .unwrap_or(false)
}

/// `<dir>/<movie-basename><suffix>.mp4`
pub fn build_trailer_target_path(dir: &Path, movie_file_name: &str, suffix: &str) -> PathBuf {
    let base = Path::new(movie_file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| movie_file_name.to_string());
    dir.join(format!("{}{}.{}", base, suffix, TRAILER_TARGET_EXT))
}

/// The `.mkv` sibling of a trailer target.
pub fn fallback_trailer_path(target: &Path) -> PathBuf {
    target.with_extension(TRAILER_FALLBACK_EXT)
}

/// The `.mp4` sibling of a trailer target.
pub fn primary_trailer_path(target: &Path) -> PathBuf {
    target.with_extension(TRAILER_TARGET_EXT)
}

/// The authoritative trailer on disk: `.mkv` when present, else `.mp4`.
pub fn locate_existing_trailer(target: &Path) -> Option<PathBuf> {
    [fallback_trailer_path(target), primary_trailer_path(target)]
        .into_iter()
        .find(|p| p.is_file())
}

/// Every trailer file present for a target, `.mp4` first.
pub fn trailer_candidates(target: &Path) -> Vec<PathBuf> {
    [primary_trailer_path(target), fallback_trailer_path(target)]
        .into_iter()
        .filter(|p| p.is_file())
        .collect()
}

/// Immediate subdirectories of a library root, sorted by name.
pub async fn walk_movies(root: &Path) -> io::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        warn!("Root not found or not a directory: {}", root.display());
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    let mut entries = fs::read_dir(root).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            dirs.push(entry.path());
        } else if entry.path().is_dir() {
            // symlinked folder
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}
