use super::{
    types::{Config, MIN_API_KEY_LEN},
    ConfigError,
};

/// What a command needs from the configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Requirements {
    /// A usable TMDB key must be present.
    pub tmdb_key: bool,
    /// At least one library root must be configured.
    pub roots: bool,
}

impl Requirements {
    /// Batch scan: searches TMDB across every root.
    pub fn scan() -> Self {
        Self {
            tmdb_key: true,
            roots: true,
        }
    }

    /// Stats: read-only walk over the roots.
    pub fn stats() -> Self {
        Self {
            tmdb_key: false,
            roots: true,
        }
    }

    /// Manual fetch: the video id comes from the command line.
    pub fn fetch() -> Self {
        Self::default()
    }
}

/// Validate configuration
/// Currently validates:
/// - TMDB key length (when required)
/// - At least one root under [paths] (when required)
/// - Non-zero preferred height and a non-empty extension set
pub fn validate_config(config: &Config, requirements: Requirements) -> Result<(), ConfigError> {
    if requirements.tmdb_key && config.auth.tmdb_api_key.len() < MIN_API_KEY_LEN {
        return Err(ConfigError::ValidationError(
            "missing or invalid TMDB API key in [auth]".to_string(),
        ));
    }

    if requirements.roots && config.roots().is_empty() {
        return Err(ConfigError::ValidationError(
            "no roots configured under [paths], add at least one directory".to_string(),
        ));
    }

    if config.settings.preferred_height == 0 {
        return Err(ConfigError::ValidationError(
            "settings.preferred_height cannot be 0".to_string(),
        ));
    }

    if config.settings.video_exts.is_empty() {
        return Err(ConfigError::ValidationError(
            "settings.video_exts must list at least one extension".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> Config {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_validate_valid_scan_config() {
        let config = config(
            r#"
[auth]
tmdb_api_key = "0123456789abcdef"

[paths]
movies = "/media/movies"
"#,
        );
        assert!(validate_config(&config, Requirements::scan()).is_ok());
    }

    #[test]
    fn test_validate_short_tmdb_key_fails_for_scan() {
        let config = config(
            r#"
[auth]
tmdb_api_key = "abc"

[paths]
movies = "/media/movies"
"#,
        );
        let result = validate_config(&config, Requirements::scan());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_missing_roots_fails_for_stats() {
        let config = config("[settings]\nlanguage = \"en\"\n");
        let result = validate_config(&config, Requirements::stats());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_fetch_needs_neither_key_nor_roots() {
        let config = config("");
        assert!(validate_config(&config, Requirements::fetch()).is_ok());
    }

    #[test]
    fn test_validate_zero_height_fails() {
        let config = config("[settings]\npreferred_height = 0\n");
        let result = validate_config(&config, Requirements::fetch());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
