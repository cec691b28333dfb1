//! yt-dlp based downloader implementation.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

use super::config::DownloaderConfig;
use super::error::DownloaderError;
use super::traits::VideoDownloader;
use super::types::{Container, DownloadOutcome, DownloadRequest};

/// Printed once the file reached its final name.
const OUTCOME_TEMPLATE: &str =
    "after_move:%(.{height,ext,vcodec,acodec,format_id,filepath})j";

/// Runs the `yt-dlp` binary as a child process.
pub struct YtDlpDownloader {
    config: DownloaderConfig,
}

impl YtDlpDownloader {
    pub fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }

    /// Builds yt-dlp arguments for a request.
    pub fn build_args(request: &DownloadRequest) -> Vec<String> {
        let mut args: Vec<String> = [
            "--quiet",
            "--no-progress",
            "--no-warnings",
            "--no-playlist",
            "--no-simulate",
            "--continue",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.extend([
            "-o".to_string(),
            request.output_path.to_string_lossy().to_string(),
            "-P".to_string(),
            format!("temp:{}", request.temp_dir.to_string_lossy()),
            "-f".to_string(),
            request.format.clone(),
        ]);

        if !request.format_sort.is_empty() {
            args.extend([
                "-S".to_string(),
                request.format_sort.join(","),
                "--format-sort-force".to_string(),
            ]);
        }

        // Player clients and manifest handling
        let mut extractor_args = format!(
            "youtube:player_client={}",
            request.player_clients.join(",")
        );
        if !request.include_manifests {
            extractor_args.push_str(";skip=dash,hls");
        }
        if !request.player_clients.is_empty() || !request.include_manifests {
            args.extend(["--extractor-args".to_string(), extractor_args]);
        }

        // Retries with exponential back-off (1, 2, 4, 8 seconds)
        args.extend([
            "--retries".to_string(),
            request.retries.to_string(),
            "--fragment-retries".to_string(),
            request.fragment_retries.to_string(),
            "--retry-sleep".to_string(),
            "http:exp=1:8".to_string(),
            "--retry-sleep".to_string(),
            "fragment:exp=1:8".to_string(),
            "-N".to_string(),
            "1".to_string(),
        ]);

        // Container
        let ext = request.container.extension();
        args.extend([
            "--merge-output-format".to_string(),
            ext.to_string(),
            "--remux-video".to_string(),
            ext.to_string(),
        ]);
        if request.container == Container::Mp4 {
            args.extend([
                "--postprocessor-args".to_string(),
                "ffmpeg:-movflags +faststart".to_string(),
            ]);
        }

        if let Some(country) = &request.geo_bypass_country {
            args.extend(["--geo-bypass-country".to_string(), country.clone()]);
        }

        args.extend(["--print".to_string(), OUTCOME_TEMPLATE.to_string()]);

        args.push(request.url.clone());
        args
    }

    /// Reads the outcome line printed after the final move.
    fn parse_outcome(stdout: &str) -> DownloadOutcome {
        stdout
            .lines()
            .rev()
            .map(str::trim)
            .filter(|l| l.starts_with('{'))
            .find_map(|l| serde_json::from_str(l).ok())
            .unwrap_or_default()
    }

    /// Last `ERROR:` line of stderr, or the trimmed tail.
    fn error_summary(stderr: &str) -> Option<String> {
        stderr
            .lines()
            .rev()
            .find(|l| l.starts_with("ERROR:"))
            .or_else(|| stderr.lines().rev().find(|l| !l.trim().is_empty()))
            .map(|l| l.trim().to_string())
    }
}

#[async_trait]
impl VideoDownloader for YtDlpDownloader {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn download(&self, request: &DownloadRequest) -> Result<DownloadOutcome, DownloaderError> {
        let args = Self::build_args(request);
        debug!(
            "{}: {} {}",
            request.label,
            self.config.yt_dlp_path.display(),
            args.join(" ")
        );

        let child = Command::new(&self.config.yt_dlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DownloaderError::BinaryNotFound {
                        path: self.config.yt_dlp_path.clone(),
                    }
                } else {
                    DownloaderError::Io(e)
                }
            })?;

        // Dropping the child on timeout kills it.
        let output = timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| DownloaderError::Timeout {
            timeout_secs: self.config.timeout_secs,
        })??;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            let message = Self::error_summary(&stderr)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            return Err(DownloaderError::failed(
                message,
                (!stderr.trim().is_empty()).then_some(stderr),
            ));
        }

        if !request.output_path.is_file() {
            return Err(DownloaderError::OutputMissing {
                path: request.output_path.clone(),
            });
        }

        let outcome = Self::parse_outcome(&String::from_utf8_lossy(&output.stdout));
        info!(
            "{} finished: {} {} (fmt:{})",
            request.label,
            outcome
                .height
                .map(|h| format!("{}p", h))
                .unwrap_or_else(|| "unknown".to_string()),
            outcome.ext.as_deref().unwrap_or("?"),
            outcome.format_id.as_deref().unwrap_or("?")
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn request(container: Container, include_manifests: bool) -> DownloadRequest {
        DownloadRequest {
            url: "https://www.youtube.com/watch?v=YoHD9XEInc0".to_string(),
            output_path: PathBuf::from("/tmp/trailers/inception-trailer.mp4"),
            temp_dir: PathBuf::from("/tmp/trailers"),
            format: "best".to_string(),
            format_sort: vec!["res:1080".to_string(), "res".to_string()],
            container,
            player_clients: vec!["android".to_string(), "web".to_string()],
            include_manifests,
            retries: 10,
            fragment_retries: 10,
            geo_bypass_country: Some("DE".to_string()),
            label: "MP4 pass".to_string(),
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_build_args_mp4() {
        let args = YtDlpDownloader::build_args(&request(Container::Mp4, true));

        assert_eq!(
            value_after(&args, "-o"),
            Some("/tmp/trailers/inception-trailer.mp4")
        );
        assert_eq!(value_after(&args, "-P"), Some("temp:/tmp/trailers"));
        assert_eq!(value_after(&args, "-f"), Some("best"));
        assert_eq!(value_after(&args, "-S"), Some("res:1080,res"));
        assert!(args.contains(&"--format-sort-force".to_string()));
        assert_eq!(
            value_after(&args, "--extractor-args"),
            Some("youtube:player_client=android,web")
        );
        assert_eq!(value_after(&args, "--merge-output-format"), Some("mp4"));
        assert_eq!(value_after(&args, "--remux-video"), Some("mp4"));
        assert_eq!(
            value_after(&args, "--postprocessor-args"),
            Some("ffmpeg:-movflags +faststart")
        );
        assert_eq!(value_after(&args, "--geo-bypass-country"), Some("DE"));
        assert_eq!(value_after(&args, "--retries"), Some("10"));
        assert!(args.contains(&"--no-simulate".to_string()));
        assert_eq!(
            args.last().map(String::as_str),
            Some("https://www.youtube.com/watch?v=YoHD9XEInc0")
        );
    }

    #[test]
    fn test_build_args_mkv_without_manifests() {
        let args = YtDlpDownloader::build_args(&request(Container::Mkv, false));

        assert_eq!(value_after(&args, "--merge-output-format"), Some("mkv"));
        assert!(!args.contains(&"--postprocessor-args".to_string()));
        assert_eq!(
            value_after(&args, "--extractor-args"),
            Some("youtube:player_client=android,web;skip=dash,hls")
        );
    }

    #[test]
    fn test_parse_outcome_takes_json_line() {
        let stdout = "some noise\n{\"height\": 720, \"ext\": \"mp4\", \"vcodec\": \"avc1.4d401f\", \"acodec\": \"mp4a.40.2\", \"format_id\": \"136+140\", \"filepath\": \"/tmp/x.mp4\"}\n";
        let outcome = YtDlpDownloader::parse_outcome(stdout);
        assert_eq!(outcome.height, Some(720));
        assert_eq!(outcome.format_id.as_deref(), Some("136+140"));
        assert_eq!(outcome.filepath.as_deref(), Some(Path::new("/tmp/x.mp4")));
    }

    #[test]
    fn test_parse_outcome_tolerates_nulls_and_garbage() {
        let outcome = YtDlpDownloader::parse_outcome("{\"height\": null, \"ext\": \"mkv\"}");
        assert_eq!(outcome.height, None);
        assert_eq!(outcome.ext.as_deref(), Some("mkv"));

        assert_eq!(
            YtDlpDownloader::parse_outcome("not json"),
            DownloadOutcome::default()
        );
    }

    #[test]
    fn test_error_summary_prefers_error_line() {
        let stderr = "[youtube] Extracting URL\nERROR: fragment 1 not found, unable to continue\nsome trailing line\n";
        assert_eq!(
            YtDlpDownloader::error_summary(stderr).as_deref(),
            Some("ERROR: fragment 1 not found, unable to continue")
        );
        assert_eq!(YtDlpDownloader::error_summary("  \n"), None);
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let downloader = YtDlpDownloader::new(DownloaderConfig {
            yt_dlp_path: PathBuf::from("/nonexistent/bin/yt-dlp"),
            timeout_secs: 5,
        });
        let result = downloader
            .download(&request(Container::Mp4, true))
            .await;
        assert!(matches!(result, Err(DownloaderError::BinaryNotFound { .. })));
    }
}
