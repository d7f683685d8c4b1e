//! User-friendly error messages and classification
//!
//! Callers surface these to distinguish "the query failed" from the other
//! failure modes. "No data in range" never reaches this module: an empty
//! series is a successful result.

use super::types::{TelemetryError, UnifiedError};
use crate::recovery::ErrorClass;

/// Error category for user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad time window or other caller input
    UserInput,
    /// Catalog lookup failures
    ResourceUnavailable,
    /// Backend rejected or failed the query
    QueryFailed,
    /// Backend did not finish in time
    Timeout,
    /// Caller-initiated cancellation
    Cancellation,
    /// Configuration issues
    Configuration,
    /// Transport level failures
    Network,
    /// Internal errors
    Internal,
}

impl ErrorCategory {
    /// Get a user-friendly category name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::UserInput => "Invalid Input",
            Self::ResourceUnavailable => "Resource Unavailable",
            Self::QueryFailed => "Query Failed",
            Self::Timeout => "Timed Out",
            Self::Cancellation => "Cancelled",
            Self::Configuration => "Configuration Error",
            Self::Network => "Network Error",
            Self::Internal => "Internal Error",
        }
    }
}

/// User-friendly error information
#[derive(Debug, Clone)]
pub struct UserFriendlyError {
    pub category: ErrorCategory,
    pub title: String,
    pub message: String,
    pub suggestions: Vec<String>,
    pub error_code: String,
}

impl UserFriendlyError {
    /// Create a new user-friendly error
    pub fn new(
        category: ErrorCategory,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            title: title.into(),
            message: message.into(),
            suggestions: Vec::new(),
            error_code: String::new(),
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Set the technical error code
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = code.into();
        self
    }

    /// Format the error for display
    pub fn format_display(&self) -> String {
        let mut output = format!(
            "{}: {}\n\n{}",
            self.category.display_name(),
            self.title,
            self.message
        );

        if !self.suggestions.is_empty() {
            output.push_str("\n\nSuggested actions:");
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("\n  {}. {}", i + 1, suggestion));
            }
        }

        output
    }
}

impl From<&TelemetryError> for UserFriendlyError {
    fn from(error: &TelemetryError) -> Self {
        let code = error.error_code().to_string();
        let friendly = match error {
            TelemetryError::TimeParse { field, .. } => UserFriendlyError::new(
                ErrorCategory::UserInput,
                format!("Invalid {}", field),
                error.to_string(),
            )
            .with_suggestion("Use RFC 3339 timestamps, e.g. 2024-05-01T10:00:00Z"),

            TelemetryError::IdentityResolution { element_id, .. } => {
                let title = match element_id {
                    Some(id) => format!("Could not resolve element '{}'", id),
                    None => "Could not resolve the target resource".to_string(),
                };
                UserFriendlyError::new(ErrorCategory::ResourceUnavailable, title, error.message())
                    .with_suggestion("Pass the resource id explicitly to skip the catalog lookup")
            }

            TelemetryError::MetricQuery {
                resource, class, ..
            } => {
                let title = match resource {
                    Some(r) => format!("Metric query failed for '{}'", r),
                    None => "Metric query failed".to_string(),
                };
                let friendly =
                    UserFriendlyError::new(ErrorCategory::QueryFailed, title, error.message());
                if *class == ErrorClass::Transient {
                    friendly.with_suggestion("The backend reported a transient failure; try again")
                } else {
                    friendly
                }
            }

            TelemetryError::FanoutExhausted { attempted, .. } => UserFriendlyError::new(
                ErrorCategory::QueryFailed,
                format!("Queries failed for all {} resources", attempted),
                error.to_string(),
            ),

            TelemetryError::LogQuery { .. } => UserFriendlyError::new(
                ErrorCategory::QueryFailed,
                "Log query failed",
                error.message(),
            )
            .with_suggestion("Check the query syntax and the log group name"),

            TelemetryError::PollTimeout { .. } => UserFriendlyError::new(
                ErrorCategory::Timeout,
                "Log query did not finish in time",
                error.to_string(),
            )
            .with_suggestion("Narrow the time window or raise the poll deadline"),

            TelemetryError::Cancelled => UserFriendlyError::new(
                ErrorCategory::Cancellation,
                "Cancelled",
                error.to_string(),
            ),

            TelemetryError::UnknownPanel { .. } => UserFriendlyError::new(
                ErrorCategory::UserInput,
                "Unknown panel",
                error.to_string(),
            )
            .with_suggestion("Register the panel in the configuration file"),

            TelemetryError::Config { .. } => UserFriendlyError::new(
                ErrorCategory::Configuration,
                "Invalid configuration",
                error.message(),
            ),

            TelemetryError::Http { .. } => UserFriendlyError::new(
                ErrorCategory::Network,
                "Request failed",
                error.message(),
            ),

            TelemetryError::Json { .. } | TelemetryError::InvalidInput { .. } => {
                UserFriendlyError::new(ErrorCategory::Internal, "Unexpected error", error.message())
            }
        };
        friendly.with_error_code(code)
    }
}

impl TelemetryError {
    /// Convert to a user-friendly error
    pub fn to_user_friendly(&self) -> UserFriendlyError {
        UserFriendlyError::from(self)
    }

    /// Short message suitable for a panel footer
    pub fn user_message(&self) -> String {
        let friendly = self.to_user_friendly();
        format!("{}: {}", friendly.category.display_name(), friendly.title)
    }
}
