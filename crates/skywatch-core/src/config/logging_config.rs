//! Logging configuration

use serde::{Deserialize, Serialize};

/// Subscriber settings, see [`crate::logging::init`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset, e.g. `info` or `skywatch_core=debug`
    pub level: String,
    /// `pretty`, `compact` or `json`
    pub format: String,
    /// Whether to include span events for instrumented calls
    pub span_events: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            span_events: false,
        }
    }
}
