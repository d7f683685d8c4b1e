//! Panel definitions loaded from configuration

use crate::error::TelemetryResult;
use crate::metrics::{Dimension, QueryDescriptor, Statistic};
use crate::resource::ResourceType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One entry of the dispatch table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelDefinition {
    /// Name callers use to select the panel, e.g. `cpu_utilization_panel`
    pub query_name: String,
    pub resource_type: ResourceType,
    #[serde(flatten)]
    pub kind: PanelKind,
}

/// What a panel queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelKind {
    Metric(MetricPanel),
    Log(LogPanel),
}

/// Metric panel: one or more series against the resolved resource(s)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricPanel {
    pub series: Vec<SeriesSpec>,
    /// Query every requested resource concurrently instead of one
    #[serde(default)]
    pub fan_out: bool,
    /// Reduce each series to one value locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Statistic>,
}

/// Log panel: one query string run against the resolved log group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogPanel {
    pub query: String,
}

/// One labelled series of a metric panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    /// Key of the series in the output
    pub label: String,
    pub metric_name: String,
    /// Overrides the resource type's default namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Overrides the resource type's default dimension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_name: Option<String>,
    #[serde(default = "default_statistic")]
    pub statistic: Statistic,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub period: Option<Duration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_dimensions: Vec<Dimension>,
}

fn default_statistic() -> Statistic {
    Statistic::Average
}

impl SeriesSpec {
    pub fn new(label: impl Into<String>, metric_name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            metric_name: metric_name.into(),
            namespace: None,
            dimension_name: None,
            statistic: default_statistic(),
            period: None,
            extra_dimensions: Vec::new(),
        }
    }

    pub fn with_statistic(mut self, statistic: Statistic) -> Self {
        self.statistic = statistic;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Unbound query template for a resource type
    pub fn descriptor(&self, resource_type: &ResourceType) -> TelemetryResult<QueryDescriptor> {
        let mut builder = QueryDescriptor::for_resource_type(resource_type, &self.metric_name)
            .statistic(self.statistic);
        if let Some(namespace) = &self.namespace {
            builder = builder.namespace(namespace);
        }
        if let Some(dimension) = &self.dimension_name {
            builder = builder.dimension_name(dimension);
        }
        if let Some(period) = self.period {
            builder = builder.period(period);
        }
        for dimension in &self.extra_dimensions {
            builder = builder.extra_dimension(dimension.clone());
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_uses_type_defaults_and_overrides() {
        let spec = SeriesSpec::new("Invocations", "Invocations")
            .with_statistic(Statistic::Sum)
            .with_namespace("AWS/Lambda");
        let descriptor = spec.descriptor(&ResourceType::Lambda).unwrap();
        assert_eq!(descriptor.namespace(), "AWS/Lambda");
        assert_eq!(descriptor.dimension_name(), "FunctionName");
        assert_eq!(descriptor.statistic(), Statistic::Sum);
        assert_eq!(descriptor.period(), Duration::from_secs(60));
    }

    #[test]
    fn test_definition_json_shape() {
        let json = r#"{
            "query_name": "nlb_connection_panel",
            "resource_type": "NLB",
            "kind": "metric",
            "series": [
                {"label": "Successful", "metric_name": "NewFlowCount", "statistic": "Sum"},
                {"label": "Failed", "metric_name": "TCP_Client_Reset_Count", "statistic": "Sum",
                 "period": "5m"}
            ]
        }"#;
        let definition: PanelDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(definition.resource_type, ResourceType::Nlb);
        match definition.kind {
            PanelKind::Metric(metric) => {
                assert_eq!(metric.series.len(), 2);
                assert!(!metric.fan_out);
                assert_eq!(metric.series[1].period, Some(Duration::from_secs(300)));
            }
            other => panic!("unexpected panel kind: {other:?}"),
        }
    }
}
