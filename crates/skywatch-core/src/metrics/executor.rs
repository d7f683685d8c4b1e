//! Single metric query execution

use super::backend::{MetricBackend, MetricDataOutput, MetricDataQuery, MetricDataRequest};
use super::descriptor::QueryDescriptor;
use crate::error::{TelemetryError, TelemetryResult};
use crate::recovery::{ErrorClass, classify_backend_error};
use crate::resource::ResourceIdentity;
use crate::time_range::TimeWindow;
use std::sync::Arc;
use tracing::instrument;

/// Issues one metric query per call and returns the backend output untouched
#[derive(Clone)]
pub struct MetricQueryExecutor {
    backend: Arc<dyn MetricBackend>,
}

impl MetricQueryExecutor {
    pub fn new(backend: Arc<dyn MetricBackend>) -> Self {
        Self { backend }
    }

    /// Build the backend request: one query per dimension value, ids `m1..mN`
    pub fn build_request(
        descriptor: &QueryDescriptor,
        window: &TimeWindow,
        resource: &ResourceIdentity,
    ) -> TelemetryResult<MetricDataRequest> {
        if descriptor.dimension_values().is_empty() {
            return Err(TelemetryError::metric_query(
                resource.id.as_str(),
                format!(
                    "no dimension values for {}/{}",
                    descriptor.namespace(),
                    descriptor.metric_name()
                ),
                ErrorClass::Permanent,
            ));
        }

        let queries = descriptor
            .dimension_values()
            .iter()
            .enumerate()
            .map(|(i, value)| MetricDataQuery {
                id: format!("m{}", i + 1),
                label: value.clone(),
                namespace: descriptor.namespace().to_string(),
                metric_name: descriptor.metric_name().to_string(),
                dimensions: descriptor.dimensions_for(value),
                period: descriptor.period().as_secs(),
                stat: descriptor.statistic(),
            })
            .collect();

        Ok(MetricDataRequest {
            metric_data_queries: queries,
            start_time: window.start(),
            end_time: window.end(),
        })
    }

    /// Execute `descriptor` over `window`. Exactly one backend call.
    #[instrument(
        skip(self, descriptor, window, resource),
        fields(resource = %resource, metric = descriptor.metric_name()),
        level = "debug"
    )]
    pub async fn execute(
        &self,
        descriptor: &QueryDescriptor,
        window: &TimeWindow,
        resource: &ResourceIdentity,
    ) -> TelemetryResult<MetricDataOutput> {
        let request = Self::build_request(descriptor, window, resource)?;
        tracing::debug!(
            "Querying {}/{} ({}) for {} series",
            descriptor.namespace(),
            descriptor.metric_name(),
            descriptor.statistic(),
            request.metric_data_queries.len()
        );

        match self.backend.get_metric_data(&request).await {
            Ok(output) => {
                tracing::debug!(
                    "Backend returned {} series for {}",
                    output.metric_data_results.len(),
                    resource
                );
                Ok(output)
            }
            Err(e) => {
                let class = classify_backend_error(&e);
                tracing::debug!("Metric query for {} failed ({:?}): {}", resource, class, e);
                Err(TelemetryError::metric_query(resource.id.as_str(), e.to_string(), class))
            }
        }
    }
}
