//! Stats reporter integration tests over a temporary library.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use trailerfetch_core::testing::{fixtures, MockProber};
use trailerfetch_core::{load_config_from_str, RunContext, StatsReporter, TrailerStatus};

fn context(library: &Path) -> RunContext {
    let toml = format!(
        "[settings]\nlanguage = \"en\"\npreferred_height = 1080\n\n[paths]\nmovies = '{}'\nblank = ''\n",
        library.display()
    );
    RunContext::new(load_config_from_str(&toml).expect("Failed to parse test config"))
}

#[tokio::test]
async fn test_classifies_every_movie() {
    let library = TempDir::new().unwrap();
    let root = library.path();

    let inception = fixtures::movie_folder(root, "Inception (2010)", "inception.mkv", 64);
    fixtures::write_trailer(&inception.join("inception-trailer.mp4"), Some(1080));

    let heat = fixtures::movie_folder(root, "Heat (1995)", "heat.mkv", 64);
    fixtures::write_trailer(&heat.join("heat-trailer.mp4"), Some(480));
    fixtures::write_trailer(&heat.join("heat-trailer.mkv"), Some(720));

    let alien = fixtures::movie_folder(root, "Alien", "alien.avi", 64);
    std::fs::write(alien.join("alien-trailer.mp4"), "not a video").unwrap();

    fixtures::movie_folder(root, "Arrival (2016)", "arrival.mp4", 64);
    fixtures::movie_folder(root, "Extras", "notes.txt", 64);

    let ctx = context(root);
    let report = StatsReporter::new(&ctx, Arc::new(MockProber::new()))
        .collect()
        .await;

    assert_eq!(report.roots, vec![root.to_path_buf()]);
    assert_eq!(report.total(), 4);
    assert_eq!(report.with_trailer(), 3);

    let status_of = |name: &str| {
        report
            .movies
            .iter()
            .find(|m| m.title.title == name)
            .map(|m| m.status.clone())
            .unwrap()
    };
    assert_eq!(
        status_of("Inception"),
        TrailerStatus::Satisfied {
            path: inception.join("inception-trailer.mp4"),
            height: 1080,
        }
    );
    // the higher of the two containers represents the movie
    assert_eq!(
        status_of("Heat"),
        TrailerStatus::BelowTarget {
            path: heat.join("heat-trailer.mkv"),
            height: Some(720),
        }
    );
    assert_eq!(
        status_of("Alien"),
        TrailerStatus::BelowTarget {
            path: alien.join("alien-trailer.mp4"),
            height: None,
        }
    );
    assert_eq!(status_of("Arrival"), TrailerStatus::Missing);

    let text = report.render(0);
    assert!(text.contains("Language: en | Preferred height: 1080p"));
    assert!(text.contains("Total movie folders: 4"));
    assert!(text.contains("Trailers present   : 3 (75.0% coverage)"));
    assert!(text.contains("Below target height: 2"));
    assert!(text.contains("Completely missing : 1"));
    assert!(text.contains("  1. Arrival (2016)"));
}

#[tokio::test]
async fn test_missing_root_is_skipped() {
    let library = TempDir::new().unwrap();
    let ctx = context(&library.path().join("gone"));

    let report = StatsReporter::new(&ctx, Arc::new(MockProber::new()))
        .collect()
        .await;

    assert_eq!(report.total(), 0);
    assert_eq!(report.errors, 0);
    assert!(report.render(5).contains("All movies have at least one trailer."));
}

#[cfg(unix)]
#[tokio::test]
async fn test_unreadable_folder_does_not_abort_report() {
    use std::os::unix::fs::PermissionsExt;

    let library = TempDir::new().unwrap();
    let root = library.path();
    let heat = fixtures::movie_folder(root, "Heat (1995)", "heat.mkv", 64);
    fixtures::write_trailer(&heat.join("heat-trailer.mp4"), Some(1080));
    let locked = fixtures::movie_folder(root, "Alien (1979)", "alien.mkv", 64);
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

    // privileged users can still list the folder
    let readable = std::fs::read_dir(&locked).is_ok();

    let ctx = context(root);
    let report = StatsReporter::new(&ctx, Arc::new(MockProber::new()))
        .collect()
        .await;
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

    if readable {
        assert_eq!(report.errors, 0);
        assert_eq!(report.total(), 2);
    } else {
        assert_eq!(report.errors, 1);
        assert_eq!(report.total(), 1);
        assert_eq!(report.movies[0].title.title, "Heat");
    }
}
