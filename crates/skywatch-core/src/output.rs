//! Panel output: normalized JSON document or raw provider frames

use crate::error::{TelemetryError, TelemetryResult};
use crate::logs::QueryResultsPage;
use crate::metrics::MetricDataOutput;
use crate::normalize::{LogRecord, TimeSeries};
use crate::time_range::TimeWindow;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Requested output representation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    /// Normalized document
    #[default]
    Json,
    /// Raw backend responses keyed by series label
    Frame,
}

impl FromStr for ResponseType {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "json" => Ok(Self::Json),
            "frame" => Ok(Self::Frame),
            other => Err(TelemetryError::invalid_input_field(
                format!("unknown response type '{}'", other),
                "responseType",
            )),
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Frame => f.write_str("frame"),
        }
    }
}

/// Raw backend response kept for frame output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawFrame {
    Metric(MetricDataOutput),
    Logs(Vec<QueryResultsPage>),
}

/// Everything a panel run produced, before choosing a representation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelData {
    pub query_name: String,
    pub window: TimeWindow,
    #[serde(skip)]
    pub raw: BTreeMap<String, RawFrame>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub series: BTreeMap<String, TimeSeries>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub summaries: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<LogRecord>,
    /// Per-resource failures of a partially successful fan-out
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<String, String>,
}

impl PanelData {
    pub fn new(query_name: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            query_name: query_name.into(),
            window,
            raw: BTreeMap::new(),
            series: BTreeMap::new(),
            summaries: BTreeMap::new(),
            records: Vec::new(),
            failures: BTreeMap::new(),
        }
    }

    /// True when no series has points and no log rows came back
    pub fn has_no_data(&self) -> bool {
        self.series.values().all(TimeSeries::is_empty) && self.records.is_empty()
    }
}

/// Result of one panel run
#[derive(Debug, Clone, PartialEq)]
pub struct PanelResponse {
    data: PanelData,
}

impl PanelResponse {
    pub fn new(data: PanelData) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &PanelData {
        &self.data
    }

    pub fn into_data(self) -> PanelData {
        self.data
    }

    /// Representation as a JSON value
    pub fn to_value(&self, response_type: ResponseType) -> TelemetryResult<serde_json::Value> {
        let value = match response_type {
            ResponseType::Json => serde_json::to_value(&self.data)?,
            ResponseType::Frame => serde_json::to_value(&self.data.raw)?,
        };
        Ok(value)
    }

    /// Representation as JSON text
    pub fn render(&self, response_type: ResponseType) -> TelemetryResult<String> {
        let text = match response_type {
            ResponseType::Json => serde_json::to_string(&self.data)?,
            ResponseType::Frame => serde_json::to_string(&self.data.raw)?,
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricDataResult;
    use crate::normalize::normalize_metric;
    use chrono::{TimeZone, Utc};

    fn response() -> PanelResponse {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 11, 55, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let raw = MetricDataOutput {
            metric_data_results: vec![MetricDataResult {
                id: "m1".to_string(),
                label: Some("i-1".to_string()),
                timestamps: vec![start],
                values: vec![42.0],
                status_code: Some("Complete".to_string()),
            }],
            messages: vec![],
        };

        let mut data = PanelData::new("cpu_utilization_panel", TimeWindow::new(start, end).unwrap());
        data.series.insert("CPUUtilization".to_string(), normalize_metric(&raw));
        data.raw.insert("CPUUtilization".to_string(), RawFrame::Metric(raw));
        PanelResponse::new(data)
    }

    #[test]
    fn test_response_type_parse() {
        assert_eq!("frame".parse::<ResponseType>().unwrap(), ResponseType::Frame);
        assert_eq!("JSON".parse::<ResponseType>().unwrap(), ResponseType::Json);
        assert_eq!("".parse::<ResponseType>().unwrap(), ResponseType::Json);
        assert!("table".parse::<ResponseType>().is_err());
    }

    #[test]
    fn test_json_document() {
        let value = response().to_value(ResponseType::Json).unwrap();
        assert_eq!(value["queryName"], "cpu_utilization_panel");
        assert_eq!(value["series"]["CPUUtilization"][0]["Value"], 42.0);
        assert!(value.get("records").is_none());
        assert!(value.get("raw").is_none());
    }

    #[test]
    fn test_frame_is_raw_map_by_label() {
        let value = response().to_value(ResponseType::Frame).unwrap();
        assert_eq!(
            value["CPUUtilization"]["MetricDataResults"][0]["Values"][0],
            42.0
        );
    }

    #[test]
    fn test_render_matches_value() {
        let response = response();
        let text = response.render(ResponseType::Frame).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, response.to_value(ResponseType::Frame).unwrap());
        assert!(!response.data().has_no_data());
    }
}
