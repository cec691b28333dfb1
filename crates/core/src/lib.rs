pub mod batch;
pub mod config;
pub mod context;
pub mod downloader;
pub mod engine;
pub mod external_catalog;
pub mod language;
pub mod library;
pub mod placer;
pub mod probe;
pub mod resolver;
pub mod stats;
pub mod testing;

pub use batch::{BatchRunner, BatchSummary, FolderOutcome};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, Requirements,
};
pub use context::RunContext;
pub use engine::{UpgradeEngine, UpgradeReport, UpgradeRequest};
pub use language::Language;
pub use library::{MovieFolder, TitleExtractor, TitleGuess};
pub use resolver::{ResolvedTrailer, TrailerResolver, TrailerSource};
pub use stats::{StatsReport, StatsReporter, TrailerStatus};
