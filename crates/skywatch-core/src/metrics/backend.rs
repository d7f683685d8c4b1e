//! Metric backend interface and provider-native payloads
//!
//! Payload field names follow the provider's wire shape (`MetricDataResults`,
//! `Timestamps`, `Values`) so the raw frame output reads like the native API.

use super::descriptor::{Dimension, Statistic};
use crate::backend::BackendError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One series requested from the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDataQuery {
    pub id: String,
    pub label: String,
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    /// Bucket width in seconds
    pub period: u64,
    pub stat: Statistic,
}

/// One backend call: several series over one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDataRequest {
    pub metric_data_queries: Vec<MetricDataQuery>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// One returned series: parallel timestamp and value lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDataResult {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub timestamps: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub values: Vec<f64>,
    /// `Complete`, `PartialData` and so on
    #[serde(default)]
    pub status_code: Option<String>,
}

/// Raw backend output for one call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDataOutput {
    #[serde(default)]
    pub metric_data_results: Vec<MetricDataResult>,
    #[serde(default)]
    pub messages: Vec<String>,
}

/// Time-series backend. Shared read-only across concurrent tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricBackend: Send + Sync {
    /// Execute one metric data request
    async fn get_metric_data(
        &self,
        request: &MetricDataRequest,
    ) -> Result<MetricDataOutput, BackendError>;
}
