use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Library roots; the key names are free-form labels.
    #[serde(default)]
    pub paths: BTreeMap<String, String>,
}

impl Config {
    /// Library roots in key order, blank entries dropped.
    pub fn roots(&self) -> Vec<PathBuf> {
        self.paths
            .values()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    /// The YouTube key, if one long enough to be plausible is configured.
    pub fn youtube_api_key(&self) -> Option<&str> {
        let key = self.auth.youtube_api_key.trim();
        (key.len() >= MIN_API_KEY_LEN).then_some(key)
    }
}

/// Keys shorter than this are treated as missing.
pub const MIN_API_KEY_LEN: usize = 10;

/// API credentials
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub tmdb_api_key: String,
    #[serde(default)]
    pub youtube_api_key: String,
}

/// Download and library behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SettingsConfig {
    #[serde(default = "default_language", deserialize_with = "lowercase")]
    pub language: String,
    #[serde(default)]
    pub strict_language: bool,
    #[serde(
        default = "default_video_exts",
        deserialize_with = "comma_separated_exts"
    )]
    pub video_exts: BTreeSet<String>,
    #[serde(default = "default_trailer_suffix")]
    pub trailer_suffix: String,
    #[serde(default = "default_preferred_height")]
    pub preferred_height: u32,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_true")]
    pub allow_non_mp4_for_quality: bool,
    #[serde(default = "default_true")]
    pub upgrade_existing: bool,
    #[serde(default = "default_api_delay_ms")]
    pub api_delay_ms: u64,
}

impl SettingsConfig {
    pub fn api_delay(&self) -> Duration {
        Duration::from_millis(self.api_delay_ms)
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            strict_language: false,
            video_exts: default_video_exts(),
            trailer_suffix: default_trailer_suffix(),
            preferred_height: default_preferred_height(),
            temp_dir: default_temp_dir(),
            allow_non_mp4_for_quality: true,
            upgrade_existing: true,
            api_delay_ms: default_api_delay_ms(),
        }
    }
}

fn default_language() -> String {
    "de".to_string()
}

fn default_video_exts() -> BTreeSet<String> {
    parse_exts("mkv,mp4,m4v,avi,mov")
}

fn default_trailer_suffix() -> String {
    "-trailer".to_string()
}

fn default_preferred_height() -> u32 {
    1080
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("trailerfetch")
}

fn default_true() -> bool {
    true
}

fn default_api_delay_ms() -> u64 {
    250
}

/// External tool locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: PathBuf,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
    /// Defaults to the region of the configured language.
    #[serde(default)]
    pub geo_bypass_country: Option<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: default_yt_dlp_path(),
            ffprobe_path: default_ffprobe_path(),
            download_timeout_secs: default_download_timeout(),
            geo_bypass_country: None,
        }
    }
}

fn default_yt_dlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_download_timeout() -> u64 {
    900
}

/// Splits "mkv, .MP4,avi" into {"mkv", "mp4", "avi"}.
pub fn parse_exts(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn lowercase<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_lowercase())
}

fn comma_separated_exts<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Exts {
        Csv(String),
        List(Vec<String>),
    }

    Ok(match Exts::deserialize(deserializer)? {
        Exts::Csv(raw) => parse_exts(&raw),
        Exts::List(items) => parse_exts(&items.join(",")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config_uses_defaults() {
        let toml = r#"
[paths]
movies = "/media/movies"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.settings.language, "de");
        assert!(!config.settings.strict_language);
        assert_eq!(config.settings.trailer_suffix, "-trailer");
        assert_eq!(config.settings.preferred_height, 1080);
        assert!(config.settings.allow_non_mp4_for_quality);
        assert!(config.settings.video_exts.contains("mkv"));
        assert!(config.settings.video_exts.contains("mov"));
        assert_eq!(config.tools.yt_dlp_path, PathBuf::from("yt-dlp"));
        assert_eq!(config.roots(), vec![PathBuf::from("/media/movies")]);
    }

    #[test]
    fn test_video_exts_are_normalised() {
        let toml = r#"
[settings]
video_exts = " MKV, .mp4 ,, avi"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let exts: Vec<_> = config.settings.video_exts.iter().cloned().collect();
        assert_eq!(exts, vec!["avi", "mkv", "mp4"]);
    }

    #[test]
    fn test_video_exts_accepts_list() {
        let toml = r#"
[settings]
video_exts = ["mkv", ".M4V"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.settings.video_exts.contains("m4v"));
        assert_eq!(config.settings.video_exts.len(), 2);
    }

    #[test]
    fn test_language_is_lowercased() {
        let toml = r#"
[settings]
language = " EN "
strict_language = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.settings.language, "en");
        assert!(config.settings.strict_language);
    }

    #[test]
    fn test_blank_roots_are_dropped() {
        let toml = r#"
[paths]
a = "/movies/a"
b = "   "
c = "/movies/c"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.roots(),
            vec![PathBuf::from("/movies/a"), PathBuf::from("/movies/c")]
        );
    }

    #[test]
    fn test_short_youtube_key_is_ignored() {
        let toml = r#"
[auth]
youtube_api_key = "short"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.youtube_api_key().is_none());
    }
}
