//! Probe-then-compare-then-move, shared by every pass.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::library::trailer_candidates;
use crate::placer::{cleanup_temp, move_into_place, remove_file_if_exists, PlacerError};
use crate::probe::describe_height;

/// The trailer currently on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentTrailer {
    pub path: PathBuf,
    pub height: Option<u32>,
}

/// Result of comparing a candidate against the current trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacementDecision {
    /// The candidate now lives at `path`.
    Replaced { path: PathBuf, height: Option<u32> },
    /// The candidate was deleted; the current trailer stays.
    Discarded { kept: CurrentTrailer },
}

/// Whether a candidate of `new_height` should replace `current`.
///
/// Nothing on disk: always. Otherwise the candidate needs a known height that
/// is strictly greater than the current one; a current trailer of unknown
/// height loses to any candidate of known height.
pub fn is_improvement(new_height: Option<u32>, current: Option<&CurrentTrailer>) -> bool {
    let Some(current) = current else {
        return true;
    };
    match (new_height, current.height) {
        (Some(new), Some(old)) => new > old,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Keeps the better of `candidate` and `current` at `destination`.
///
/// On replacement every other trailer of the movie is removed first, in
/// either container, then the candidate is moved in. On discard the candidate
/// and its temp siblings are deleted.
pub async fn consider_replacement(
    candidate: &Path,
    candidate_height: Option<u32>,
    current: Option<&CurrentTrailer>,
    destination: &Path,
) -> Result<ReplacementDecision, PlacerError> {
    if let Some(current) = current {
        if !is_improvement(candidate_height, Some(current)) {
            info!(
                "Existing trailer is equal/better ({}) than new {}, discarding",
                describe_height(current.height),
                describe_height(candidate_height)
            );
            discard_candidate(candidate, destination).await;
            return Ok(ReplacementDecision::Discarded {
                kept: current.clone(),
            });
        }
        if current.path != destination {
            remove_file_if_exists(&current.path).await?;
        }
    }

    for stale in trailer_candidates(destination) {
        if stale != destination {
            remove_file_if_exists(&stale).await?;
        }
    }

    let placed = move_into_place(candidate, destination).await;
    discard_candidate(candidate, destination).await;
    placed?;

    info!(
        "Placed trailer ({}): {}",
        describe_height(candidate_height),
        destination.display()
    );
    Ok(ReplacementDecision::Replaced {
        path: destination.to_path_buf(),
        height: candidate_height,
    })
}

/// Deletes a candidate and its temp siblings. Siblings are only swept when
/// the candidate lives outside the destination folder.
async fn discard_candidate(candidate: &Path, destination: &Path) {
    if candidate == destination {
        return;
    }
    if candidate.parent() != destination.parent() {
        cleanup_temp(candidate).await;
    } else if let Err(e) = remove_file_if_exists(candidate).await {
        warn!("{}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs;

    fn current(path: &Path, height: Option<u32>) -> CurrentTrailer {
        CurrentTrailer {
            path: path.to_path_buf(),
            height,
        }
    }

    #[test]
    fn test_is_improvement_rules() {
        let p = Path::new("/m/t.mp4");
        assert!(is_improvement(None, None));
        assert!(is_improvement(Some(480), None));
        assert!(is_improvement(Some(1080), Some(&current(p, Some(720)))));
        assert!(!is_improvement(Some(720), Some(&current(p, Some(720)))));
        assert!(!is_improvement(Some(480), Some(&current(p, Some(720)))));
        assert!(is_improvement(Some(480), Some(&current(p, None))));
        assert!(!is_improvement(None, Some(&current(p, None))));
        assert!(!is_improvement(None, Some(&current(p, Some(360)))));
    }

    #[tokio::test]
    async fn test_equal_height_discards_candidate_and_keeps_old() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("movie-trailer.mp4");
        let candidate = temp.path().join("tmp").join("movie-trailer.mp4");
        fs::create_dir(temp.path().join("tmp")).await.unwrap();
        fs::write(&dest, b"old").await.unwrap();
        fs::write(&candidate, b"new").await.unwrap();

        let decision = consider_replacement(
            &candidate,
            Some(1080),
            Some(&current(&dest, Some(1080))),
            &dest,
        )
        .await
        .unwrap();

        assert!(matches!(decision, ReplacementDecision::Discarded { .. }));
        assert_eq!(fs::read(&dest).await.unwrap(), b"old");
        assert!(!candidate.exists());
    }

    #[tokio::test]
    async fn test_better_candidate_replaces_other_container() {
        let temp = TempDir::new().unwrap();
        let old_mp4 = temp.path().join("movie-trailer.mp4");
        let dest = temp.path().join("movie-trailer.mkv");
        let candidate = temp.path().join("tmp").join("movie-trailer.mkv");
        fs::create_dir(temp.path().join("tmp")).await.unwrap();
        fs::write(&old_mp4, b"old").await.unwrap();
        fs::write(&candidate, b"new").await.unwrap();

        let decision = consider_replacement(
            &candidate,
            Some(2160),
            Some(&current(&old_mp4, Some(1080))),
            &dest,
        )
        .await
        .unwrap();

        assert_eq!(
            decision,
            ReplacementDecision::Replaced {
                path: dest.clone(),
                height: Some(2160)
            }
        );
        assert!(!old_mp4.exists());
        assert_eq!(fs::read(&dest).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_replacement_leaves_a_single_trailer() {
        let temp = TempDir::new().unwrap();
        let old_mp4 = temp.path().join("movie-trailer.mp4");
        let dest = temp.path().join("movie-trailer.mkv");
        let candidate = temp.path().join("tmp").join("movie-trailer.mkv");
        fs::create_dir(temp.path().join("tmp")).await.unwrap();
        fs::write(&old_mp4, b"480").await.unwrap();
        fs::write(&dest, b"720").await.unwrap();
        fs::write(&candidate, b"900").await.unwrap();

        consider_replacement(&candidate, Some(900), Some(&current(&dest, Some(720))), &dest)
            .await
            .unwrap();

        assert!(!old_mp4.exists());
        assert_eq!(fs::read(&dest).await.unwrap(), b"900");
    }

    #[tokio::test]
    async fn test_unknown_candidate_placed_when_nothing_exists() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("movie-trailer.mp4");
        let candidate = temp.path().join("candidate.mp4");
        fs::write(&candidate, b"new").await.unwrap();

        let decision = consider_replacement(&candidate, None, None, &dest)
            .await
            .unwrap();

        assert!(matches!(decision, ReplacementDecision::Replaced { height: None, .. }));
        assert!(dest.exists());
    }
}
