//! Per-run context built once from the loaded configuration.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::downloader::{DownloaderConfig, YtDlpDownloader};
use crate::engine::{UpgradeEngine, UpgradeRequest};
use crate::external_catalog::{
    CatalogError, MovieCatalog, TmdbClient, TmdbConfig, VideoSearch, YouTubeSearchClient,
    YouTubeSearchConfig,
};
use crate::language::Language;
use crate::library::TitleExtractor;
use crate::probe::{FfprobeProber, HeightProber};
use crate::resolver::TrailerResolver;

/// Immutable state shared by everything one invocation does.
#[derive(Debug)]
pub struct RunContext {
    pub config: Config,
    pub titles: TitleExtractor,
    pub language: Language,
}

impl RunContext {
    pub fn new(config: Config) -> Self {
        let language = Language::from_code(&config.settings.language);
        if !language.is_known() {
            warn!(
                "Unknown language '{}', using English locale data",
                language.code
            );
        }

        Self {
            config,
            titles: TitleExtractor::new(),
            language,
        }
    }

    /// Configured geo bypass country, else the language's region.
    pub fn geo_bypass_country(&self) -> String {
        self.config
            .tools
            .geo_bypass_country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(self.language.region)
            .to_uppercase()
    }

    /// Resolver over the given metadata services, configured from settings.
    pub fn resolver(
        &self,
        catalog: Arc<dyn MovieCatalog>,
        video_search: Option<Arc<dyn VideoSearch>>,
    ) -> TrailerResolver {
        let resolver = TrailerResolver::new(catalog, self.language.clone())
            .with_strict_language(self.config.settings.strict_language)
            .with_api_delay(self.config.settings.api_delay());
        match video_search {
            Some(search) => resolver.with_video_search(search),
            None => resolver,
        }
    }

    /// Resolver backed by TMDB and, when a key is configured, YouTube search.
    pub fn http_resolver(&self) -> Result<TrailerResolver, CatalogError> {
        let tmdb = TmdbClient::new(TmdbConfig::new(self.config.auth.tmdb_api_key.clone()))?;

        let search: Option<Arc<dyn VideoSearch>> = match self.config.youtube_api_key() {
            Some(key) => Some(Arc::new(YouTubeSearchClient::new(
                YouTubeSearchConfig::new(key),
            )?)),
            None => {
                warn!("No usable YouTube API key, video search fallback disabled");
                None
            }
        };

        Ok(self.resolver(Arc::new(tmdb), search))
    }

    /// ffprobe as configured under `[tools]`.
    pub fn ffprobe(&self) -> Arc<dyn HeightProber> {
        Arc::new(FfprobeProber::new(self.config.tools.ffprobe_path.clone()))
    }

    /// Engine driving yt-dlp and ffprobe as configured under `[tools]`.
    pub fn ytdlp_engine(&self) -> UpgradeEngine {
        let downloader = YtDlpDownloader::new(DownloaderConfig::from(&self.config.tools));
        UpgradeEngine::new(Arc::new(downloader), self.ffprobe())
            .with_geo_bypass_country(self.geo_bypass_country())
    }

    /// Engine inputs for one trailer target.
    pub fn upgrade_request(
        &self,
        target_path: &Path,
        video_id: &str,
        existing_height: Option<u32>,
    ) -> UpgradeRequest {
        let settings = &self.config.settings;
        UpgradeRequest {
            target_path: target_path.to_path_buf(),
            video_id: video_id.to_string(),
            preferred_height: settings.preferred_height,
            temp_dir: settings.temp_dir.clone(),
            allow_non_mp4: settings.allow_non_mp4_for_quality,
            existing_height,
        }
    }

    /// Logs the effective settings once at startup.
    pub fn log_summary(&self) {
        let settings = &self.config.settings;
        info!(
            "Config loaded: language={} strict={} exts={} suffix='{}' preferred={}p roots={:?}",
            self.language.code,
            settings.strict_language,
            settings
                .video_exts
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(","),
            settings.trailer_suffix,
            settings.preferred_height,
            self.config.roots()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    #[test]
    fn test_geo_bypass_defaults_to_language_region() {
        let ctx = RunContext::new(
            load_config_from_str("[settings]\nlanguage = \"fr\"\n").unwrap(),
        );
        assert_eq!(ctx.geo_bypass_country(), "FR");

        let ctx = RunContext::new(
            load_config_from_str("[settings]\nlanguage = \"fr\"\n[tools]\ngeo_bypass_country = \"ch\"\n")
                .unwrap(),
        );
        assert_eq!(ctx.geo_bypass_country(), "CH");
    }

    #[test]
    fn test_upgrade_request_uses_settings() {
        let ctx = RunContext::new(
            load_config_from_str(
                "[settings]\npreferred_height = 720\nallow_non_mp4_for_quality = false\ntemp_dir = \"/tmp/tf\"\n",
            )
            .unwrap(),
        );
        let request = ctx.upgrade_request(Path::new("/m/a-trailer.mp4"), "YoHD9XEInc0", Some(480));

        assert_eq!(request.preferred_height, 720);
        assert!(!request.allow_non_mp4);
        assert_eq!(request.temp_dir, Path::new("/tmp/tf"));
        assert_eq!(request.existing_height, Some(480));
    }

    #[test]
    fn test_http_resolver_requires_tmdb_key() {
        let ctx = RunContext::new(load_config_from_str("").unwrap());
        assert!(matches!(
            ctx.http_resolver(),
            Err(CatalogError::NotConfigured(_))
        ));
    }
}
