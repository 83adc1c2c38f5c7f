use crate::dupes::DuplicateOptions;
use crate::faces::FaceOptions;
use crate::sorter::SortOptions;
use crate::error::Error;
use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;

/// Directory name reserved for cached data inside an organised root.
pub const CACHE_DIRNAME: &str = ".smartsort_cache";

/// Per-run settings for every operation. Loaded once by the caller and passed
/// explicitly into each operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sort: SortOptions,
    pub duplicates: DuplicateOptions,
    pub faces: FaceOptions,
    /// Glob patterns excluded from every scan.
    pub ignore_patterns: Vec<String>,
}

/// Read `Config.toml` (optional) and `SMARTSORT__*` environment overrides.
pub fn load_configuration() -> Result<AppConfig, Error> {
    let config = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("SMARTSORT").separator("__"))
        .build()?;
    into_app_config(config)
}

fn into_app_config(config: Config) -> Result<AppConfig, Error> {
    Ok(config.try_deserialize::<AppConfig>()?)
}
