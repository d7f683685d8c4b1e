//! Shared backend error type
//!
//! Metric and log backends are external collaborators. They report failures
//! as a [`BackendError`], which the engine classifies and wraps into the
//! matching [`TelemetryError`](crate::error::TelemetryError) variant.

use std::fmt;

/// Error reported by a metric or log backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// Provider error code, e.g. `Throttling` or `InvalidParameterValue`
    pub code: Option<String>,
    /// Provider error message
    pub message: String,
    /// HTTP status of the failed call, if the transport exposed one
    pub status_code: Option<u16>,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            status_code: None,
        }
    }

    pub fn status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, self.status_code) {
            (Some(code), Some(status)) => write!(f, "{} ({}): {}", code, status, self.message),
            (Some(code), None) => write!(f, "{}: {}", code, self.message),
            (None, Some(status)) => write!(f, "status {}: {}", status, self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code_and_status() {
        let err = BackendError::with_code("Throttling", "Rate exceeded").status(400);
        assert_eq!(err.to_string(), "Throttling (400): Rate exceeded");
        assert_eq!(BackendError::new("boom").to_string(), "boom");
    }
}
