//! Configuration management for the telemetry engine

mod env_loader;
mod file_loader;
mod logging_config;

pub mod model;

pub use env_loader::{
    ENV_CATALOG_URL, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_MAX_CONCURRENCY, ENV_POLL_DEADLINE,
    ENV_POLL_INTERVAL, apply_env_overrides, apply_env_overrides_with,
};
pub use file_loader::load_from_file;
pub use logging_config::LoggingConfig;
pub use model::{
    CatalogConfig, DEFAULT_CATALOG_URL, EngineConfig, FanoutConfig, MAX_DEADLINE, MAX_LOOKBACK,
    PollerConfig, WindowConfig,
};

use crate::error::TelemetryResult;
use std::path::{Path, PathBuf};

/// Default config location: `<config dir>/skywatch/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("skywatch").join("config.toml"))
}

/// Load configuration with default sources
///
/// Loads configuration in this order:
/// 1. Default configuration
/// 2. `<config dir>/skywatch/config.toml` (if exists)
/// 3. Environment variables
pub fn load_config() -> TelemetryResult<EngineConfig> {
    let config = match default_config_path() {
        Some(path) => load_from_file(&path)?,
        None => EngineConfig::default(),
    };
    finish(apply_env_overrides(config)?)
}

/// Load configuration from a custom file path, then apply env overrides
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> TelemetryResult<EngineConfig> {
    let config = load_from_file(path.as_ref())?;
    finish(apply_env_overrides(config)?)
}

fn finish(config: EngineConfig) -> TelemetryResult<EngineConfig> {
    config.validate()?;
    tracing::debug!(
        "Loaded config: {} panels, max_concurrency {}",
        config.panels.len(),
        config.fanout.max_concurrency
    );
    Ok(config)
}
