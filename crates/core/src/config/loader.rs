use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable consulted when `[auth] tmdb_api_key` is empty.
pub const TMDB_KEY_ENV: &str = "TMDB_API_KEY";
/// Environment variable consulted when `[auth] youtube_api_key` is empty.
pub const YOUTUBE_KEY_ENV: &str = "YT_API_KEY";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("TRAILERFETCH_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    finish(config, |key| std::env::var(key).ok())
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let config: Config =
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    finish(config, |_| None)
}

/// Fills credentials from the environment and anchors the temp dir.
fn finish(
    mut config: Config,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    apply_key_fallbacks(&mut config, env_lookup);

    config.settings.temp_dir = std::path::absolute(&config.settings.temp_dir).map_err(|e| {
        ConfigError::ValidationError(format!(
            "temp_dir {} cannot be resolved: {}",
            config.settings.temp_dir.display(),
            e
        ))
    })?;

    Ok(config)
}

fn apply_key_fallbacks(config: &mut Config, env_lookup: impl Fn(&str) -> Option<String>) {
    let auth = &mut config.auth;
    auth.tmdb_api_key = auth.tmdb_api_key.trim().to_string();
    auth.youtube_api_key = auth.youtube_api_key.trim().to_string();

    if auth.tmdb_api_key.is_empty() {
        if let Some(value) = env_lookup(TMDB_KEY_ENV) {
            auth.tmdb_api_key = value.trim().to_string();
        }
    }
    if auth.youtube_api_key.is_empty() {
        if let Some(value) = env_lookup(YOUTUBE_KEY_ENV) {
            auth.youtube_api_key = value.trim().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[auth]
tmdb_api_key = "0123456789abcdef"

[settings]
language = "en"
preferred_height = 720

[paths]
movies = "/media/movies"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.settings.language, "en");
        assert_eq!(config.settings.preferred_height, 720);
        assert_eq!(config.auth.tmdb_api_key, "0123456789abcdef");
    }

    #[test]
    fn test_load_config_from_str_invalid_height() {
        let toml = r#"
[settings]
preferred_height = "tall"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/trailers.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[auth]
tmdb_api_key = "0123456789abcdef"
youtube_api_key = "yt-0123456789"

[settings]
trailer_suffix = "-preview"
temp_dir = "/var/tmp/trailers"

[paths]
hd = "/media/hd"
uhd = "/media/uhd"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.settings.trailer_suffix, "-preview");
        assert_eq!(
            config.settings.temp_dir,
            std::path::PathBuf::from("/var/tmp/trailers")
        );
        assert_eq!(config.roots().len(), 2);
        assert_eq!(config.youtube_api_key(), Some("yt-0123456789"));
    }

    #[test]
    fn test_relative_temp_dir_becomes_absolute() {
        let config = load_config_from_str("[settings]\ntemp_dir = \"./tmp\"\n").unwrap();
        assert!(config.settings.temp_dir.is_absolute());
        assert!(config.settings.temp_dir.ends_with("tmp"));
    }

    #[test]
    fn test_env_fallback_only_fills_empty_keys() {
        let mut config: Config = toml::from_str(
            r#"
[auth]
tmdb_api_key = "  "
youtube_api_key = "from-file-0123"
"#,
        )
        .unwrap();

        apply_key_fallbacks(&mut config, |key| match key {
            TMDB_KEY_ENV => Some("env-tmdb-0123456".to_string()),
            YOUTUBE_KEY_ENV => Some("env-youtube-0123".to_string()),
            _ => None,
        });

        assert_eq!(config.auth.tmdb_api_key, "env-tmdb-0123456");
        assert_eq!(config.auth.youtube_api_key, "from-file-0123");
    }
}
