//! External downloader seam and its yt-dlp implementation.

mod config;
mod error;
mod traits;
mod types;
mod ytdlp;

pub use config::DownloaderConfig;
pub use error::DownloaderError;
pub use traits::VideoDownloader;
pub use types::{watch_url, Container, DownloadOutcome, DownloadRequest};
pub use ytdlp::YtDlpDownloader;
