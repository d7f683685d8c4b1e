//! Metric query descriptors

use crate::error::{TelemetryError, TelemetryResult};
use crate::resource::{ResourceIdentity, ResourceType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default aggregation bucket width
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60);

/// Server-side aggregation applied within each period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    Sum,
    Average,
    Maximum,
    Minimum,
    SampleCount,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "Sum",
            Self::Average => "Average",
            Self::Maximum => "Maximum",
            Self::Minimum => "Minimum",
            Self::SampleCount => "SampleCount",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Statistic {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "average" | "avg" => Ok(Self::Average),
            "maximum" | "max" => Ok(Self::Maximum),
            "minimum" | "min" => Ok(Self::Minimum),
            "samplecount" => Ok(Self::SampleCount),
            other => Err(TelemetryError::invalid_input_field(
                format!("unknown statistic '{}'", other),
                "statistic",
            )),
        }
    }
}

/// A name/value pair narrowing a metric to one resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Immutable description of one metric query.
///
/// A descriptor may target several resources through several dimension
/// values. Templates are usually built without values and bound to each
/// resource with [`QueryDescriptor::bind`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    namespace: String,
    metric_name: String,
    dimension_name: String,
    dimension_values: Vec<String>,
    extra_dimensions: Vec<Dimension>,
    statistic: Statistic,
    period: Duration,
}

impl QueryDescriptor {
    /// Start building a descriptor for a metric
    pub fn builder(metric_name: impl Into<String>) -> QueryDescriptorBuilder {
        QueryDescriptorBuilder::new(metric_name)
    }

    /// Builder pre-filled with the namespace and dimension defaults of a type
    pub fn for_resource_type(
        resource_type: &ResourceType,
        metric_name: impl Into<String>,
    ) -> QueryDescriptorBuilder {
        QueryDescriptorBuilder::new(metric_name)
            .namespace(resource_type.default_namespace())
            .dimension_name(resource_type.default_dimension())
    }

    /// Copy of this descriptor targeting exactly one resource
    pub fn bind(&self, resource: &ResourceIdentity) -> Self {
        Self {
            dimension_values: vec![resource.id.clone()],
            ..self.clone()
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    pub fn dimension_name(&self) -> &str {
        &self.dimension_name
    }

    pub fn dimension_values(&self) -> &[String] {
        &self.dimension_values
    }

    pub fn extra_dimensions(&self) -> &[Dimension] {
        &self.extra_dimensions
    }

    pub fn statistic(&self) -> Statistic {
        self.statistic
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Full dimension list for one value of the primary dimension
    pub fn dimensions_for(&self, value: &str) -> Vec<Dimension> {
        let mut dimensions = Vec::with_capacity(1 + self.extra_dimensions.len());
        dimensions.push(Dimension::new(&self.dimension_name, value));
        dimensions.extend(self.extra_dimensions.iter().cloned());
        dimensions
    }
}

/// Builder for [`QueryDescriptor`]
#[derive(Debug, Clone)]
pub struct QueryDescriptorBuilder {
    namespace: Option<String>,
    metric_name: String,
    dimension_name: Option<String>,
    dimension_values: Vec<String>,
    extra_dimensions: Vec<Dimension>,
    statistic: Statistic,
    period: Duration,
}

impl QueryDescriptorBuilder {
    fn new(metric_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            metric_name: metric_name.into(),
            dimension_name: None,
            dimension_values: Vec::new(),
            extra_dimensions: Vec::new(),
            statistic: Statistic::Average,
            period: DEFAULT_PERIOD,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn dimension_name(mut self, name: impl Into<String>) -> Self {
        self.dimension_name = Some(name.into());
        self
    }

    pub fn dimension_value(mut self, value: impl Into<String>) -> Self {
        self.dimension_values.push(value.into());
        self
    }

    pub fn dimension_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimension_values.extend(values.into_iter().map(Into::into));
        self
    }

    /// Fixed dimension added to every query, e.g. an NLB target group
    pub fn extra_dimension(mut self, dimension: Dimension) -> Self {
        self.extra_dimensions.push(dimension);
        self
    }

    pub fn statistic(mut self, statistic: Statistic) -> Self {
        self.statistic = statistic;
        self
    }

    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn build(self) -> TelemetryResult<QueryDescriptor> {
        if self.metric_name.trim().is_empty() {
            return Err(TelemetryError::invalid_input_field(
                "metric name must not be empty",
                "metric_name",
            ));
        }
        let namespace = self
            .namespace
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| TelemetryError::invalid_input_field("namespace is required", "namespace"))?;
        let dimension_name = self
            .dimension_name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| {
                TelemetryError::invalid_input_field("dimension name is required", "dimension_name")
            })?;
        if self.period.as_secs() == 0 || self.period.subsec_nanos() != 0 {
            return Err(TelemetryError::invalid_input_field(
                format!("period must be a positive whole number of seconds, got {:?}", self.period),
                "period",
            ));
        }

        Ok(QueryDescriptor {
            namespace,
            metric_name: self.metric_name,
            dimension_name,
            dimension_values: self.dimension_values,
            extra_dimensions: self.extra_dimensions,
            statistic: self.statistic,
            period: self.period,
        })
    }
}
