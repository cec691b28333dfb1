mod video_id;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use thiserror::Error;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trailerfetch_core::engine::AttemptOutcome;
use trailerfetch_core::library::locate_existing_trailer;
use trailerfetch_core::probe::{describe_height, height_or_unknown};
use trailerfetch_core::{
    load_config, validate_config, BatchRunner, ConfigError, MovieFolder, Requirements, RunContext,
    StatsReporter,
};

use video_id::parse_video_id;

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the trailer for one movie folder from a given video
    Fetch {
        /// Movie folder holding the main video file
        movie_dir: PathBuf,
        /// YouTube URL or 11 character video id
        url_or_id: String,
    },
    /// Find and download trailers for every movie under the configured roots
    Scan,
    /// Report trailer coverage and quality
    Stats {
        /// Maximum entries per listing (0 = no limit)
        #[arg(long, default_value_t = 0)]
        list_limit: usize,
    },
}

#[derive(Parser, Debug)]
#[command(version, about = "Trailer downloader for local movie libraries", long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, global = true, default_value = "trailers.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Success = 0,
    Failure = 1,
    Usage = 2,
    Interrupted = 130,
}

/// Bad command line input.
#[derive(Debug, Error)]
#[error("{0}")]
struct InvalidInput(String);

#[tokio::main]
async fn main() {
    init_tracing();
    let args = Args::parse();

    let exit = match run(args).await {
        Ok(exit) => exit,
        Err(e) => {
            error!("{:#}", e);
            exit_for(&e)
        }
    };
    std::process::exit(exit as i32);
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn exit_for(err: &anyhow::Error) -> Exit {
    let usage = err
        .chain()
        .any(|cause| cause.is::<ConfigError>() || cause.is::<InvalidInput>());
    if usage {
        Exit::Usage
    } else {
        Exit::Failure
    }
}

async fn run(args: Args) -> Result<Exit> {
    match args.command {
        Command::Fetch {
            movie_dir,
            url_or_id,
        } => fetch(&args.config, &movie_dir, &url_or_id).await,
        Command::Scan => scan(&args.config).await,
        Command::Stats { list_limit } => stats(&args.config, list_limit).await,
    }
}

fn load_context(path: &Path, requirements: Requirements) -> Result<RunContext> {
    info!("Loading configuration from {:?}", path);
    let config =
        load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?;
    validate_config(&config, requirements).context("Configuration validation failed")?;
    Ok(RunContext::new(config))
}

async fn fetch(config_path: &Path, movie_dir: &Path, url_or_id: &str) -> Result<Exit> {
    let ctx = load_context(config_path, Requirements::fetch())?;
    let settings = &ctx.config.settings;

    if !movie_dir.is_dir() {
        return Err(InvalidInput(format!("Not a directory: {}", movie_dir.display())).into());
    }
    let video_id = parse_video_id(url_or_id)
        .ok_or_else(|| InvalidInput(format!("No video id in '{}'", url_or_id)))?;

    let folder = MovieFolder::discover(movie_dir, &settings.video_exts, &settings.trailer_suffix)
        .await
        .with_context(|| format!("Failed to read {}", movie_dir.display()))?
        .ok_or_else(|| {
            InvalidInput(format!("No movie file found in {}", movie_dir.display()))
        })?;
    info!(
        "Movie: {} -> trailer target {}",
        folder.movie_file.file_name,
        folder.trailer_target.display()
    );

    let engine = ctx.ytdlp_engine();
    let existing_height = match locate_existing_trailer(&folder.trailer_target) {
        Some(existing) => {
            let height = height_or_unknown(engine.prober().as_ref(), &existing).await;
            info!(
                "Existing trailer: {} ({})",
                existing.display(),
                describe_height(height)
            );
            height
        }
        None => None,
    };

    let request = ctx.upgrade_request(&folder.trailer_target, &video_id, existing_height);
    let report = tokio::select! {
        report = engine.upgrade_trailer(&request) => report,
        _ = signal::ctrl_c() => {
            info!("Interrupted by user.");
            engine.discard_temp(&request.target_path, &request.temp_dir).await;
            return Ok(Exit::Interrupted);
        }
    };

    for attempt in &report.attempts {
        match &attempt.outcome {
            AttemptOutcome::Placed { height } => {
                info!("{}: placed ({})", attempt.strategy, describe_height(*height))
            }
            AttemptOutcome::Discarded { height } => info!(
                "{}: not better ({}), discarded",
                attempt.strategy,
                describe_height(*height)
            ),
            AttemptOutcome::Failed { reason } => warn!("{}: {}", attempt.strategy, reason),
        }
    }

    match &report.final_path {
        Some(path) => {
            info!(
                "Done: {} ({})",
                path.display(),
                describe_height(report.final_height)
            );
            Ok(Exit::Success)
        }
        None => {
            warn!("Download failed");
            Ok(Exit::Failure)
        }
    }
}

async fn scan(config_path: &Path) -> Result<Exit> {
    let ctx = load_context(config_path, Requirements::scan())?;
    ctx.log_summary();

    let resolver = ctx
        .http_resolver()
        .context("Failed to create metadata clients")?;
    let runner = BatchRunner::new(&ctx, resolver, ctx.ytdlp_engine());

    let summary = runner
        .run(async {
            if let Err(e) = signal::ctrl_c().await {
                warn!("Cannot listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(if summary.interrupted {
        Exit::Interrupted
    } else {
        Exit::Success
    })
}

async fn stats(config_path: &Path, list_limit: usize) -> Result<Exit> {
    let ctx = load_context(config_path, Requirements::stats())?;

    let report = StatsReporter::new(&ctx, ctx.ffprobe()).collect().await;
    if report.errors > 0 {
        warn!("{} folder(s) could not be read", report.errors);
    }
    print!("{}", report.render(list_limit));

    Ok(Exit::Success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_fetch() {
        let args = Args::parse_from([
            "trailerfetch",
            "-c",
            "my.toml",
            "fetch",
            "/movies/Heat (1995)",
            "YoHD9XEInc0",
        ]);
        assert_eq!(args.config, PathBuf::from("my.toml"));
        assert!(matches!(
            args.command,
            Command::Fetch { ref url_or_id, .. } if url_or_id == "YoHD9XEInc0"
        ));
    }

    #[test]
    fn test_cli_defaults() {
        let args = Args::parse_from(["trailerfetch", "stats"]);
        assert_eq!(args.config, PathBuf::from("trailers.toml"));
        assert!(matches!(args.command, Command::Stats { list_limit: 0 }));
    }

    #[test]
    fn test_exit_codes() {
        let config: anyhow::Error = ConfigError::FileNotFound("x.toml".to_string()).into();
        assert_eq!(exit_for(&config.context("Failed to load config")), Exit::Usage);

        let input: anyhow::Error = InvalidInput("bad".to_string()).into();
        assert_eq!(exit_for(&input), Exit::Usage);

        assert_eq!(exit_for(&anyhow::anyhow!("boom")), Exit::Failure);
    }
}
