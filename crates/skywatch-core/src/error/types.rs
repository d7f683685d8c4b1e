//! Core error types and traits

use crate::recovery::ErrorClass;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for engine operations
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Unified error trait implemented by [`TelemetryError`].
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> String;

    /// Get optional context about the error
    fn context(&self) -> Option<&str> {
        None
    }

    /// Check if this error is retryable by the caller
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Which side of the time window failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Start,
    End,
}

impl fmt::Display for TimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "startTime"),
            Self::End => write!(f, "endTime"),
        }
    }
}

/// Main error type for the telemetry engine
#[derive(Error, Debug, Clone)]
pub enum TelemetryError {
    /// Malformed or inconsistent time window input
    #[error("Invalid {field} '{input}': {reason}")]
    TimeParse {
        field: TimeField,
        input: String,
        reason: String,
    },

    /// The resource catalog could not resolve an element
    #[error("Identity resolution failed: {message}")]
    IdentityResolution {
        message: String,
        element_id: Option<String>,
        context: Option<String>,
    },

    /// A metric backend rejected or failed a query
    #[error("Metric query failed: {message}")]
    MetricQuery {
        message: String,
        resource: Option<String>,
        class: ErrorClass,
        context: Option<String>,
    },

    /// Every resource in a fan-out failed
    #[error("All {attempted} resource queries failed")]
    FanoutExhausted {
        attempted: usize,
        /// (resource id, failure message) for every resource
        failures: Vec<(String, String)>,
    },

    /// A log query failed on the backend
    #[error("Log query failed: {message}")]
    LogQuery {
        message: String,
        query_id: Option<String>,
        context: Option<String>,
    },

    /// Polling a log query exceeded its deadline or was cancelled
    #[error("Log query {query_id} did not complete within {elapsed:?}")]
    PollTimeout { query_id: String, elapsed: Duration },

    /// The operation was cancelled by the caller
    #[error("Operation was cancelled")]
    Cancelled,

    /// No panel is registered for the requested key
    #[error("No panel '{query_name}' registered for resource type '{resource_type}'")]
    UnknownPanel {
        query_name: String,
        resource_type: String,
    },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// HTTP transport errors
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        url: Option<String>,
        status_code: Option<u16>,
        context: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        context: Option<String>,
    },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
        context: Option<String>,
    },
}

impl UnifiedError for TelemetryError {
    fn error_code(&self) -> &str {
        match self {
            Self::TimeParse { .. } => "SKYWATCH_TIME_PARSE",
            Self::IdentityResolution { .. } => "SKYWATCH_IDENTITY",
            Self::MetricQuery { .. } => "SKYWATCH_METRIC_QUERY",
            Self::FanoutExhausted { .. } => "SKYWATCH_FANOUT_EXHAUSTED",
            Self::LogQuery { .. } => "SKYWATCH_LOG_QUERY",
            Self::PollTimeout { .. } => "SKYWATCH_POLL_TIMEOUT",
            Self::Cancelled => "SKYWATCH_CANCELLED",
            Self::UnknownPanel { .. } => "SKYWATCH_UNKNOWN_PANEL",
            Self::Config { .. } => "SKYWATCH_CONFIG",
            Self::Http { .. } => "SKYWATCH_HTTP",
            Self::Json { .. } => "SKYWATCH_JSON",
            Self::InvalidInput { .. } => "SKYWATCH_INVALID_INPUT",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::IdentityResolution { message, .. }
            | Self::MetricQuery { message, .. }
            | Self::LogQuery { message, .. }
            | Self::Config { message, .. }
            | Self::Http { message, .. }
            | Self::Json { message, .. }
            | Self::InvalidInput { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::IdentityResolution { context, .. }
            | Self::MetricQuery { context, .. }
            | Self::LogQuery { context, .. }
            | Self::Config { context, .. }
            | Self::Http { context, .. }
            | Self::Json { context, .. }
            | Self::InvalidInput { context, .. } => context.as_deref(),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::MetricQuery { class, .. } => *class == ErrorClass::Transient,
            Self::Http { status_code, .. } => {
                matches!(status_code, Some(429) | Some(502) | Some(503) | Some(504))
            }
            Self::PollTimeout { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_parse_display_names_field() {
        let err = TelemetryError::time_parse(TimeField::Start, "yesterday", "bad format");
        assert_eq!(
            err.to_string(),
            "Invalid startTime 'yesterday': bad format"
        );
        assert_eq!(err.error_code(), "SKYWATCH_TIME_PARSE");
    }

    #[test]
    fn test_metric_query_retryable_follows_class() {
        let transient = TelemetryError::metric_query("i-1", "Throttling", ErrorClass::Transient);
        let permanent = TelemetryError::metric_query("i-1", "AccessDenied", ErrorClass::Permanent);
        assert!(transient.is_retryable());
        assert!(!permanent.is_retryable());
    }

    #[test]
    fn test_context_is_exposed() {
        let err = TelemetryError::config_with_context("bad value", "reading panels");
        assert_eq!(err.context(), Some("reading panels"));
        assert_eq!(err.message(), "bad value");
    }
}
