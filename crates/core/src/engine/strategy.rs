//! The ordered download strategies and when each one applies.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::fmt;

use crate::downloader::Container;

/// One download pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Best video+audio biased toward mp4/AVC, DASH and HLS allowed.
    Mp4First,
    /// Segmented (m3u8) streams only.
    HlsOnly,
    /// Single-file HTTP mp4 streams, manifests disabled.
    ProgressiveMp4,
    /// Any codec, remuxed into mkv.
    AnyToMkv,
}

impl StrategyKind {
    /// Pass name used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::Mp4First => "MP4 pass",
            StrategyKind::HlsOnly => "HLS pass",
            StrategyKind::ProgressiveMp4 => "Progressive MP4 pass",
            StrategyKind::AnyToMkv => "MKV pass",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// When a strategy runs, given what happened before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    Always,
    /// The MP4 pass failed with a fragment-403 style error and nothing was decided yet.
    AfterFragment403,
    /// The MP4 pass failed and nothing was decided yet.
    AfterMp4Failure,
    /// Enabled by configuration; runs while the on-disk trailer is missing,
    /// of unknown height, or below the preferred height.
    QualityFallback,
}

/// A download strategy descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub kind: StrategyKind,
    pub container: Container,
    pub player_clients: &'static [&'static str],
    pub include_manifests: bool,
    pub applicability: Applicability,
}

impl Strategy {
    /// Format selection expression for a preferred height.
    pub fn format(&self, h: u32) -> String {
        match self.kind {
            StrategyKind::Mp4First => format!(
                "bestvideo[height={h}][ext=mp4]+bestaudio[ext=m4a]/\
                 bestvideo[height={h}]+bestaudio/\
                 best[height={h}]/\
                 bestvideo[height<={h}][ext=mp4]+bestaudio[ext=m4a]/\
                 best[height<={h}]/\
                 best"
            ),
            StrategyKind::HlsOnly => format!(
                "bestvideo[protocol^=m3u8][height={h}]+bestaudio[protocol^=m3u8]/\
                 best[protocol^=m3u8][height={h}]/\
                 bestvideo[protocol^=m3u8][height<={h}]+bestaudio[protocol^=m3u8]/\
                 best[protocol^=m3u8][height<={h}]"
            ),
            StrategyKind::ProgressiveMp4 => format!(
                "best[ext=mp4][protocol^=http][height={h}]/\
                 best[ext=mp4][protocol^=http][height<={h}]/\
                 best[ext=mp4][protocol^=http]/\
                 best[protocol^=http]"
            ),
            StrategyKind::AnyToMkv => format!(
                "bestvideo[height={h}]+bestaudio/\
                 best[height={h}]/\
                 bestvideo[height<={h}]+bestaudio/\
                 best[height<={h}]/\
                 best"
            ),
        }
    }

    /// Format ranking keys for a preferred height.
    pub fn format_sort(&self, h: u32) -> Vec<String> {
        let mut keys = vec![format!("res:{}", h), "res".to_string()];
        match self.kind {
            StrategyKind::Mp4First => keys.extend(
                ["ext:mp4:m4a", "codec:avc", "vbr", "abr"]
                    .iter()
                    .map(|s| s.to_string()),
            ),
            StrategyKind::HlsOnly | StrategyKind::AnyToMkv => {
                keys.extend(["vbr", "abr"].iter().map(|s| s.to_string()))
            }
            StrategyKind::ProgressiveMp4 => {}
        }
        keys
    }
}

/// MP4 → HLS → progressive → MKV.
pub fn default_strategies() -> Vec<Strategy> {
    vec![
        Strategy {
            kind: StrategyKind::Mp4First,
            container: Container::Mp4,
            player_clients: &["android", "ios", "web"],
            include_manifests: true,
            applicability: Applicability::Always,
        },
        Strategy {
            kind: StrategyKind::HlsOnly,
            container: Container::Mp4,
            player_clients: &["web", "android", "ios"],
            include_manifests: true,
            applicability: Applicability::AfterFragment403,
        },
        Strategy {
            kind: StrategyKind::ProgressiveMp4,
            container: Container::Mp4,
            player_clients: &["web"],
            include_manifests: false,
            applicability: Applicability::AfterMp4Failure,
        },
        Strategy {
            kind: StrategyKind::AnyToMkv,
            container: Container::Mkv,
            player_clients: &["android", "ios", "web"],
            include_manifests: true,
            applicability: Applicability::QualityFallback,
        },
    ]
}

static FRAGMENT_403: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(HTTP Error 403|fragment\s+1\s+not\s+found)")
        .expect("built-in fragment pattern")
});

/// Whether a downloader failure looks like an expired-fragment 403.
pub fn is_fragment_403(failure_text: &str) -> bool {
    FRAGMENT_403.is_match(failure_text)
}

/// What the driver knows when deciding whether a strategy applies.
#[derive(Debug, Clone, Default)]
pub struct PassState {
    /// Failure text of the MP4 pass, if it failed.
    pub mp4_failure: Option<String>,
    /// Some pass produced a file and a keep/discard decision was made.
    pub decided: bool,
    /// A trailer is on disk.
    pub trailer_exists: bool,
    /// Probed height of the on-disk trailer.
    pub current_height: Option<u32>,
    pub preferred_height: u32,
    pub allow_non_mp4: bool,
}

impl PassState {
    pub fn applies(&self, applicability: Applicability) -> bool {
        match applicability {
            Applicability::Always => true,
            Applicability::AfterFragment403 => {
                !self.decided
                    && self
                        .mp4_failure
                        .as_deref()
                        .is_some_and(is_fragment_403)
            }
            Applicability::AfterMp4Failure => !self.decided && self.mp4_failure.is_some(),
            Applicability::QualityFallback => {
                self.allow_non_mp4
                    && (!self.trailer_exists
                        || self
                            .current_height
                            .is_none_or(|h| h < self.preferred_height))
            }
        }
    }
}
