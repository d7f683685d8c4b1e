//! Asynchronous log-search backend interface

use crate::backend::BackendError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-assigned handle for a submitted query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryId(pub String);

impl QueryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Submission parameters for one log query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartQueryRequest {
    pub log_group_name: String,
    pub query_string: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Query status as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendQueryStatus {
    Scheduled,
    Running,
    Complete,
    Failed,
    Cancelled,
    Timeout,
    Unknown,
}

impl BackendQueryStatus {
    /// Whether the backend is still working on the query
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Running => "Running",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
            Self::Timeout => "Timeout",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for BackendQueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of a result row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultField {
    pub field: String,
    pub value: String,
}

impl ResultField {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Scan statistics attached to a results page
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryStatistics {
    pub records_matched: f64,
    pub records_scanned: f64,
    pub bytes_scanned: f64,
}

/// One `get_query_results` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryResultsPage {
    pub status: BackendQueryStatus,
    #[serde(rename = "Results", default)]
    pub rows: Vec<Vec<ResultField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<QueryStatistics>,
}

impl QueryResultsPage {
    pub fn new(status: BackendQueryStatus, rows: Vec<Vec<ResultField>>) -> Self {
        Self {
            status,
            rows,
            statistics: None,
        }
    }
}

/// Asynchronous log query backend: submit, then poll by id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogBackend: Send + Sync {
    /// Submit a query and return its id
    async fn start_query(&self, request: &StartQueryRequest) -> Result<QueryId, BackendError>;

    /// Fetch the current status and whatever rows are available
    async fn get_query_results(&self, query_id: &QueryId)
    -> Result<QueryResultsPage, BackendError>;

    /// Ask the backend to abandon a query
    async fn stop_query(&self, _query_id: &QueryId) -> Result<(), BackendError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_statuses() {
        assert!(BackendQueryStatus::Scheduled.is_pending());
        assert!(BackendQueryStatus::Running.is_pending());
        assert!(!BackendQueryStatus::Complete.is_pending());
        assert!(!BackendQueryStatus::Timeout.is_pending());
    }

    #[test]
    fn test_page_wire_shape() {
        let page = QueryResultsPage::new(
            BackendQueryStatus::Complete,
            vec![vec![ResultField::new("@message", "boom")]],
        );
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["Status"], "Complete");
        assert_eq!(json["Results"][0][0]["Field"], "@message");
        assert!(json.get("Statistics").is_none());
    }
}
