//! Environment variable-based configuration overrides

use super::model::EngineConfig;
use crate::error::{TelemetryError, TelemetryResult};
use std::env;
use std::time::Duration;

pub const ENV_MAX_CONCURRENCY: &str = "SKYWATCH_MAX_CONCURRENCY";
pub const ENV_POLL_DEADLINE: &str = "SKYWATCH_POLL_DEADLINE";
pub const ENV_POLL_INTERVAL: &str = "SKYWATCH_POLL_INTERVAL";
pub const ENV_CATALOG_URL: &str = "SKYWATCH_CATALOG_URL";
pub const ENV_LOG_LEVEL: &str = "SKYWATCH_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "SKYWATCH_LOG_FORMAT";

/// Apply `SKYWATCH_*` overrides from the process environment
pub fn apply_env_overrides(config: EngineConfig) -> TelemetryResult<EngineConfig> {
    apply_env_overrides_with(config, |key| env::var(key).ok())
}

/// Apply overrides read through `lookup`
///
/// Durations use humantime syntax (`"5s"`, `"2m"`). Empty values are ignored.
pub fn apply_env_overrides_with<F>(
    mut config: EngineConfig,
    lookup: F,
) -> TelemetryResult<EngineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(value) = get(ENV_MAX_CONCURRENCY) {
        config.fanout.max_concurrency = value.trim().parse().map_err(|_| {
            TelemetryError::config_with_context(
                format!("Invalid {} value", ENV_MAX_CONCURRENCY),
                format!("Parsing '{}' as a positive integer", value),
            )
        })?;
    }

    if let Some(value) = get(ENV_POLL_DEADLINE) {
        config.poller.deadline = parse_duration(ENV_POLL_DEADLINE, &value)?;
    }

    if let Some(value) = get(ENV_POLL_INTERVAL) {
        config.poller.initial_interval = parse_duration(ENV_POLL_INTERVAL, &value)?;
        if config.poller.max_interval < config.poller.initial_interval {
            config.poller.max_interval = config.poller.initial_interval;
        }
    }

    if let Some(url) = get(ENV_CATALOG_URL) {
        config.catalog.default_url = url;
    }

    if let Some(level) = get(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }

    if let Some(format) = get(ENV_LOG_FORMAT) {
        config.logging.format = format;
    }

    Ok(config)
}

fn parse_duration(key: &str, value: &str) -> TelemetryResult<Duration> {
    humantime_serde::re::humantime::parse_duration(value.trim()).map_err(|e| {
        TelemetryError::config_with_context(
            format!("Invalid {} value: {}", key, e),
            format!("Parsing '{}' as a duration", value),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_overrides_applied() {
        let config = apply_env_overrides_with(
            EngineConfig::default(),
            lookup_from(&[
                (ENV_MAX_CONCURRENCY, "4"),
                (ENV_POLL_DEADLINE, "90s"),
                (ENV_CATALOG_URL, "http://cmdb.test/api"),
                (ENV_LOG_LEVEL, "trace"),
                (ENV_LOG_FORMAT, "json"),
            ]),
        )
        .unwrap();

        assert_eq!(config.fanout.max_concurrency, 4);
        assert_eq!(config.poller.deadline, Duration::from_secs(90));
        assert_eq!(config.catalog.default_url, "http://cmdb.test/api");
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_poll_interval_raises_max_interval() {
        let config = apply_env_overrides_with(
            EngineConfig::default(),
            lookup_from(&[(ENV_POLL_INTERVAL, "1m")]),
        )
        .unwrap();
        assert_eq!(config.poller.initial_interval, Duration::from_secs(60));
        assert_eq!(config.poller.max_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_empty_values_ignored() {
        let config = apply_env_overrides_with(
            EngineConfig::default(),
            lookup_from(&[(ENV_MAX_CONCURRENCY, ""), (ENV_LOG_LEVEL, "  ")]),
        )
        .unwrap();
        assert_eq!(config.fanout.max_concurrency, 16);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(
            apply_env_overrides_with(
                EngineConfig::default(),
                lookup_from(&[(ENV_MAX_CONCURRENCY, "many")]),
            )
            .is_err()
        );
        assert!(
            apply_env_overrides_with(
                EngineConfig::default(),
                lookup_from(&[(ENV_POLL_DEADLINE, "soon")]),
            )
            .is_err()
        );
    }

    #[test]
    fn test_oversized_deadline_fails_validation() {
        let config = apply_env_overrides_with(
            EngineConfig::default(),
            lookup_from(&[(ENV_POLL_DEADLINE, "500000000000years")]),
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
