//! From trait implementations for TelemetryError conversions

use super::types::TelemetryError;

impl From<anyhow::Error> for TelemetryError {
    fn from(error: anyhow::Error) -> Self {
        Self::invalid_input(error.to_string())
    }
}

impl From<serde_json::Error> for TelemetryError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<reqwest::Error> for TelemetryError {
    fn from(error: reqwest::Error) -> Self {
        let status_code = error.status().map(|s| s.as_u16());
        let url = error.url().map(|u| u.to_string());
        Self::Http {
            message: error.to_string(),
            url,
            status_code,
            context: None,
        }
    }
}
