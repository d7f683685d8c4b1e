//! Raw backend output to time series and log records

use crate::logs::{BackendQueryStatus, QueryResultsPage};
use crate::metrics::{MetricDataOutput, MetricDataResult, Statistic};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// One aggregated bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl DataPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Points ordered by ascending timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSeries {
    points: Vec<DataPoint>,
}

impl TimeSeries {
    /// Build a series, sorting by timestamp. The sort is stable.
    pub fn new(mut points: Vec<DataPoint>) -> Self {
        points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Self { points }
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<DataPoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataPoint> {
        self.points.iter()
    }

    /// Reduce the series to one value. `None` for an empty series.
    pub fn summarize(&self, statistic: Statistic) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let values = self.points.iter().map(|p| p.value);
        let summary = match statistic {
            Statistic::Sum => values.sum(),
            Statistic::Average => values.sum::<f64>() / self.points.len() as f64,
            Statistic::Maximum => values.fold(f64::NEG_INFINITY, f64::max),
            Statistic::Minimum => values.fold(f64::INFINITY, f64::min),
            Statistic::SampleCount => self.points.len() as f64,
        };
        Some(summary)
    }
}

/// One log result row as field/value pairs in backend order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub fields: Vec<(String, String)>,
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl LogRecord {
    /// First value for `field`
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }
}

/// First result series of a metric output
pub fn normalize_metric(output: &MetricDataOutput) -> TimeSeries {
    match output.metric_data_results.first() {
        Some(result) => series_from_result(result),
        None => {
            tracing::debug!("Metric output has no result series");
            TimeSeries::default()
        }
    }
}

/// Every result series keyed by label, falling back to the query id
pub fn normalize_metric_by_label(output: &MetricDataOutput) -> BTreeMap<String, TimeSeries> {
    output
        .metric_data_results
        .iter()
        .map(|result| {
            let label = result
                .label
                .clone()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| result.id.clone());
            (label, series_from_result(result))
        })
        .collect()
}

fn series_from_result(result: &MetricDataResult) -> TimeSeries {
    if result.timestamps.len() != result.values.len() {
        tracing::warn!(
            "Series {} has {} timestamps but {} values, truncating",
            result.id,
            result.timestamps.len(),
            result.values.len()
        );
    }
    let points = result
        .timestamps
        .iter()
        .zip(result.values.iter())
        .map(|(ts, value)| DataPoint::new(*ts, *value))
        .collect();
    TimeSeries::new(points)
}

/// Rows of every `Complete` page, in page order
pub fn normalize_logs(pages: &[QueryResultsPage]) -> Vec<LogRecord> {
    let mut records = Vec::new();
    for page in pages {
        if page.status != BackendQueryStatus::Complete {
            tracing::debug!(
                "Skipping {} rows from page with status {}: query status is not complete",
                page.rows.len(),
                page.status
            );
            continue;
        }
        records.extend(page.rows.iter().map(|row| LogRecord {
            fields: row
                .iter()
                .map(|f| (f.field.clone(), f.value.clone()))
                .collect(),
        }));
    }
    records
}
