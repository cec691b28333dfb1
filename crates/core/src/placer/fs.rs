//! Filesystem moves and temp cleanup.

use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

use super::PlacerError;

/// Attempts an atomic rename; `Ok(false)` when the rename crosses filesystems.
async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
    match fs::rename(source, destination).await {
        Ok(()) => Ok(true),
        Err(e) => {
            // EXDEV is 18 on Linux
            if e.kind() == ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                Ok(false)
            } else {
                Err(e)
            }
        }
    }
}

/// Moves `source` onto `destination`, overwriting it.
///
/// Renames when possible and falls back to copy + remove across filesystems.
pub async fn move_into_place(source: &Path, destination: &Path) -> Result<(), PlacerError> {
    if !source.is_file() {
        return Err(PlacerError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }

    let moved = try_atomic_move(source, destination).await.map_err(|e| {
        PlacerError::move_failed(source.to_path_buf(), destination.to_path_buf(), e)
    })?;
    if moved {
        debug!("Renamed {} -> {}", source.display(), destination.display());
        return Ok(());
    }

    debug!(
        "Cross-filesystem move, copying {} -> {}",
        source.display(),
        destination.display()
    );
    if let Err(e) = fs::copy(source, destination).await {
        // never leave a truncated trailer behind
        let _ = fs::remove_file(destination).await;
        return Err(PlacerError::copy_failed(
            source.to_path_buf(),
            destination.to_path_buf(),
            e,
        ));
    }

    remove_file_if_exists(source).await?;
    Ok(())
}

/// Removes a file; a missing file is not an error.
pub async fn remove_file_if_exists(path: &Path) -> Result<bool, PlacerError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(PlacerError::CleanupFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Removes `path` when it exists with zero length. Returns whether it did.
pub async fn remove_if_empty(path: &Path) -> bool {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() == 0 => match fs::remove_file(path).await {
            Ok(()) => {
                debug!("Removed empty file {}", path.display());
                true
            }
            Err(e) => {
                warn!("Could not remove empty file {}: {}", path.display(), e);
                false
            }
        },
        _ => false,
    }
}

/// Removes a temp output and every sibling sharing its stem
/// (`name.part`, `name.f137.mp4`, `name.ytdl`, ...).
///
/// Best effort: failures are logged, never returned.
pub async fn cleanup_temp(temp_path: &Path) {
    if let Err(e) = remove_file_if_exists(temp_path).await {
        warn!("{}", e);
    }

    let (Some(dir), Some(stem)) = (temp_path.parent(), temp_path.file_stem()) else {
        return;
    };
    let prefix = format!("{}.", stem.to_string_lossy());

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(_) => return,
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(&prefix) {
            continue;
        }
        let path = entry.path();
        if path.is_file() {
            match fs::remove_file(&path).await {
                Ok(()) => debug!("Removed temp leftover {}", path.display()),
                Err(e) => warn!("Could not remove temp leftover {}: {}", path.display(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_move_into_place_renames() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("candidate.mp4");
        let dest = temp.path().join("movie-trailer.mp4");
        fs::write(&source, b"new").await.unwrap();
        fs::write(&dest, b"old").await.unwrap();

        move_into_place(&source, &dest).await.unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&dest).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_move_into_place_missing_source() {
        let temp = TempDir::new().unwrap();
        let result = move_into_place(
            &temp.path().join("nope.mp4"),
            &temp.path().join("dest.mp4"),
        )
        .await;
        assert!(matches!(result, Err(PlacerError::SourceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_remove_file_if_exists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.mp4");
        assert!(!remove_file_if_exists(&path).await.unwrap());
        fs::write(&path, b"x").await.unwrap();
        assert!(remove_file_if_exists(&path).await.unwrap());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_if_empty_keeps_content() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("empty.mp4");
        let full = temp.path().join("full.mp4");
        fs::write(&empty, b"").await.unwrap();
        fs::write(&full, b"data").await.unwrap();

        assert!(remove_if_empty(&empty).await);
        assert!(!remove_if_empty(&full).await);
        assert!(!empty.exists());
        assert!(full.exists());
    }

    #[tokio::test]
    async fn test_cleanup_temp_removes_siblings_only() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("heat-trailer.mp4");
        for name in [
            "heat-trailer.mp4",
            "heat-trailer.mp4.part",
            "heat-trailer.f137.mp4",
            "heat-trailer.ytdl",
            "heat-trailer-extra.mp4",
            "alien-trailer.mp4",
        ] {
            fs::write(temp.path().join(name), b"x").await.unwrap();
        }

        cleanup_temp(&output).await;

        let mut left: Vec<String> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["alien-trailer.mp4", "heat-trailer-extra.mp4"]);
    }
}
