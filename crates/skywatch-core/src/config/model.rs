//! Engine configuration model

use super::logging_config::LoggingConfig;
use crate::error::{TelemetryError, TelemetryResult};
use crate::panels::{PanelDefinition, PanelKind};
use crate::recovery::BackoffConfig;
use crate::time_range::DEFAULT_LOOKBACK;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Catalog endpoint used when a request names none
pub const DEFAULT_CATALOG_URL: &str = "http://localhost:7008/api/cmdb/elements";

/// Longest accepted poll or fan-out deadline
pub const MAX_DEADLINE: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest accepted default lookback; metric retention ends around here
pub const MAX_LOOKBACK: Duration = Duration::from_secs(455 * 24 * 60 * 60);

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub fanout: FanoutConfig,
    pub poller: PollerConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
    /// Panel dispatch table
    pub panels: Vec<PanelDefinition>,
}

/// Query window defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Lookback used when no start time is given
    #[serde(with = "humantime_serde")]
    pub default_lookback: Duration,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            default_lookback: DEFAULT_LOOKBACK,
        }
    }
}

/// Fan-out concurrency limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// Maximum number of in-flight backend queries
    pub max_concurrency: usize,
    /// Overall deadline for one fan-out; none means wait for every task
    #[serde(with = "humantime_serde")]
    pub deadline: Option<Duration>,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            deadline: None,
        }
    }
}

impl FanoutConfig {
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Log query polling schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Delay before the second status poll
    #[serde(with = "humantime_serde")]
    pub initial_interval: Duration,
    /// Upper bound for the delay between polls
    #[serde(with = "humantime_serde")]
    pub max_interval: Duration,
    /// Growth factor between consecutive delays
    pub multiplier: f64,
    pub jitter: bool,
    /// Give up after this long and stop the query
    #[serde(with = "humantime_serde")]
    pub deadline: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: false,
            deadline: Duration::from_secs(5 * 60),
        }
    }
}

impl PollerConfig {
    /// Poll at a fixed interval
    pub fn fixed(interval: Duration, deadline: Duration) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            multiplier: 1.0,
            jitter: false,
            deadline,
        }
    }

    pub fn backoff_config(&self) -> BackoffConfig {
        BackoffConfig::with_initial_delay(self.initial_interval)
            .max_delay(self.max_interval)
            .multiplier(self.multiplier)
            .jitter(self.jitter)
    }
}

/// Resource catalog client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub default_url: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_url: DEFAULT_CATALOG_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    /// Check limits that serde cannot express
    pub fn validate(&self) -> TelemetryResult<()> {
        if self.window.default_lookback.is_zero() {
            return Err(TelemetryError::config("window.default_lookback must be positive"));
        }
        if self.window.default_lookback > MAX_LOOKBACK {
            return Err(TelemetryError::config(format!(
                "window.default_lookback must be at most {:?}",
                MAX_LOOKBACK
            )));
        }
        if self.fanout.max_concurrency == 0 {
            return Err(TelemetryError::config("fanout.max_concurrency must be at least 1"));
        }
        if let Some(deadline) = self.fanout.deadline {
            if deadline.is_zero() || deadline > MAX_DEADLINE {
                return Err(TelemetryError::config(format!(
                    "fanout.deadline must be positive and at most {:?}, got {:?}",
                    MAX_DEADLINE, deadline
                )));
            }
        }
        if self.poller.initial_interval.is_zero() {
            return Err(TelemetryError::config("poller.initial_interval must be positive"));
        }
        if self.poller.max_interval < self.poller.initial_interval {
            return Err(TelemetryError::config(
                "poller.max_interval must not be shorter than poller.initial_interval",
            ));
        }
        if self.poller.multiplier.is_nan() || self.poller.multiplier < 1.0 {
            return Err(TelemetryError::config(format!(
                "poller.multiplier must be >= 1.0, got {}",
                self.poller.multiplier
            )));
        }
        if self.poller.deadline.is_zero() {
            return Err(TelemetryError::config("poller.deadline must be positive"));
        }
        if self.poller.deadline > MAX_DEADLINE {
            return Err(TelemetryError::config(format!(
                "poller.deadline must be at most {:?}, got {:?}",
                MAX_DEADLINE, self.poller.deadline
            )));
        }
        if self.catalog.default_url.trim().is_empty() {
            return Err(TelemetryError::config("catalog.default_url must not be empty"));
        }

        for panel in &self.panels {
            if panel.query_name.trim().is_empty() {
                return Err(TelemetryError::config("panel query_name must not be empty"));
            }
            match &panel.kind {
                PanelKind::Metric(metric) if metric.series.is_empty() => {
                    return Err(TelemetryError::config_with_context(
                        "metric panel has no series",
                        format!("panel '{}' ({})", panel.query_name, panel.resource_type),
                    ));
                }
                PanelKind::Log(log) if log.query.trim().is_empty() => {
                    return Err(TelemetryError::config_with_context(
                        "log panel has an empty query",
                        format!("panel '{}' ({})", panel.query_name, panel.resource_type),
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::{LogPanel, MetricPanel};
    use crate::resource::ResourceType;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.window.default_lookback, Duration::from_secs(300));
        assert_eq!(config.fanout.max_concurrency, 16);
        assert_eq!(config.poller.initial_interval, Duration::from_secs(5));
        assert_eq!(config.poller.deadline, Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_poller_backoff_config() {
        let backoff = PollerConfig::default().backoff_config();
        assert_eq!(backoff.initial_delay, Duration::from_secs(5));
        assert_eq!(backoff.max_delay, Duration::from_secs(30));
        assert!(!backoff.jitter);
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let mut config = EngineConfig::default();
        config.fanout.max_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.poller.initial_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.poller.multiplier = 0.5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.poller.multiplier = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_durations() {
        let mut config = EngineConfig::default();
        config.poller.deadline = Duration::from_secs(u64::MAX / 2);
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.fanout.deadline = Some(Duration::MAX);
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.window.default_lookback = MAX_LOOKBACK + Duration::from_secs(1);
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.poller.deadline = MAX_DEADLINE;
        config.fanout.deadline = Some(MAX_DEADLINE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_panels() {
        let mut config = EngineConfig::default();
        config.panels.push(PanelDefinition {
            query_name: "cpu_utilization_panel".to_string(),
            resource_type: ResourceType::Ec2,
            kind: PanelKind::Metric(MetricPanel::default()),
        });
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.panels.push(PanelDefinition {
            query_name: "error_log_panel".to_string(),
            resource_type: ResourceType::Ecs,
            kind: PanelKind::Log(LogPanel {
                query: " ".to_string(),
            }),
        });
        assert!(config.validate().is_err());
    }
}
