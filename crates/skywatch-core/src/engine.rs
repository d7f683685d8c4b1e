//! Panel execution: registry lookup, resolution, query, normalization

use crate::config::EngineConfig;
use crate::error::{TelemetryError, TelemetryResult};
use crate::logs::{LogBackend, LogQueryPoller};
use crate::metrics::{
    ConcurrentFanoutExecutor, MetricBackend, MetricQueryExecutor, ResourceOutcome,
};
use crate::normalize::{normalize_logs, normalize_metric, normalize_metric_by_label};
use crate::output::{PanelData, PanelResponse, RawFrame, ResponseType};
use crate::panels::{LogPanel, MetricPanel, PanelKind, PanelRegistry};
use crate::resource::{
    CatalogRef, IdentityRequest, ResourceCatalog, ResourceIdentity, ResourceIdentityResolver,
    ResourceInventory, ResourceType,
};
use crate::time_range::{TimeRangeResolver, TimeWindow};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// One caller request for a panel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelRequest {
    pub query_name: String,
    pub resource_type: String,
    /// Explicit resource id; wins over the catalog
    pub resource_id: Option<String>,
    pub catalog: Option<CatalogRef>,
    /// Targets for fan-out panels. When empty, the resolved resource is used
    /// if the request names one, otherwise the inventory is enumerated.
    pub resources: Vec<String>,
    /// Explicit log group for log panels
    pub log_group: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub response_type: ResponseType,
}

impl PanelRequest {
    pub fn new(query_name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            resource_type: resource_type.into(),
            ..Default::default()
        }
    }

    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn with_catalog(mut self, catalog: CatalogRef) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_log_group(mut self, log_group: impl Into<String>) -> Self {
        self.log_group = Some(log_group.into());
        self
    }

    pub fn with_window(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.start_time = start.map(String::from);
        self.end_time = end.map(String::from);
        self
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }
}

/// Runs panel requests against injected backends
#[derive(Clone)]
pub struct TelemetryEngine {
    registry: Arc<PanelRegistry>,
    time_range: TimeRangeResolver,
    identity: ResourceIdentityResolver,
    executor: MetricQueryExecutor,
    fanout: ConcurrentFanoutExecutor,
    poller: Option<LogQueryPoller>,
    inventory: Option<Arc<dyn ResourceInventory>>,
}

impl TelemetryEngine {
    /// Build from configuration. The log backend is optional; log panels
    /// fail with a config error without one. Without an inventory, fan-out
    /// panels need explicit targets or a resolvable resource.
    pub fn new(
        config: &EngineConfig,
        metrics: Arc<dyn MetricBackend>,
        logs: Option<Arc<dyn LogBackend>>,
        catalog: Arc<dyn ResourceCatalog>,
        inventory: Option<Arc<dyn ResourceInventory>>,
    ) -> TelemetryResult<Self> {
        config.validate()?;
        let registry = PanelRegistry::from_definitions(config.panels.iter().cloned())?;
        let executor = MetricQueryExecutor::new(metrics);

        tracing::info!("Telemetry engine ready with {} panels", registry.len());
        Ok(Self {
            registry: Arc::new(registry),
            time_range: TimeRangeResolver::new(config.window.default_lookback),
            identity: ResourceIdentityResolver::new(catalog, &config.catalog.default_url),
            fanout: ConcurrentFanoutExecutor::new(executor.clone(), config.fanout.clone()),
            executor,
            poller: logs.map(|backend| LogQueryPoller::new(backend, config.poller.clone())),
            inventory,
        })
    }

    pub fn registry(&self) -> &PanelRegistry {
        &self.registry
    }

    /// Run a panel and keep both representations available
    #[instrument(
        skip(self, request, cancel),
        fields(panel = %request.query_name, resource_type = %request.resource_type)
    )]
    pub async fn run(
        &self,
        request: &PanelRequest,
        cancel: &CancellationToken,
    ) -> TelemetryResult<PanelResponse> {
        let definition = self
            .registry
            .lookup(&request.query_name, &request.resource_type)?;
        let window = self.time_range.resolve(
            request.start_time.as_deref(),
            request.end_time.as_deref(),
        )?;

        let mut data = PanelData::new(&definition.query_name, window);
        match &definition.kind {
            PanelKind::Metric(panel) if panel.fan_out => {
                let resource_type = &definition.resource_type;
                self.run_fanout(panel, resource_type, request, &window, cancel, &mut data)
                    .await?
            }
            PanelKind::Metric(panel) => {
                self.run_metric(panel, &definition.resource_type, request, &window, &mut data)
                    .await?
            }
            PanelKind::Log(panel) => self.run_log(panel, request, &window, cancel, &mut data).await?,
        }

        if data.has_no_data() {
            tracing::info!("Panel {} returned no data in range", definition.query_name);
        }
        Ok(PanelResponse::new(data))
    }

    /// Run a panel and render it in the requested representation
    pub async fn run_rendered(
        &self,
        request: &PanelRequest,
        cancel: &CancellationToken,
    ) -> TelemetryResult<String> {
        self.run(request, cancel).await?.render(request.response_type)
    }

    async fn resolve_identity(
        &self,
        request: &PanelRequest,
        resource_type: &ResourceType,
    ) -> TelemetryResult<ResourceIdentity> {
        let identity_request = IdentityRequest {
            explicit_id: request.resource_id.clone(),
            catalog: request.catalog.clone(),
            resource_type: resource_type.clone(),
        };
        self.identity.resolve(&identity_request).await
    }

    async fn run_metric(
        &self,
        panel: &MetricPanel,
        resource_type: &ResourceType,
        request: &PanelRequest,
        window: &TimeWindow,
        data: &mut PanelData,
    ) -> TelemetryResult<()> {
        let resource = self.resolve_identity(request, resource_type).await?;

        for series_spec in &panel.series {
            let descriptor = series_spec.descriptor(resource_type)?.bind(&resource);
            let raw = self.executor.execute(&descriptor, window, &resource).await?;

            let series = if raw.metric_data_results.len() > 1 {
                // Several result series under one label: keep them apart.
                for (label, series) in normalize_metric_by_label(&raw) {
                    data.series.insert(format!("{}/{}", series_spec.label, label), series);
                }
                None
            } else {
                Some(normalize_metric(&raw))
            };

            if let Some(series) = series {
                if let Some(statistic) = panel.summary {
                    if let Some(value) = series.summarize(statistic) {
                        data.summaries.insert(series_spec.label.clone(), value);
                    }
                }
                data.series.insert(series_spec.label.clone(), series);
            }
            data.raw.insert(series_spec.label.clone(), RawFrame::Metric(raw));
        }
        Ok(())
    }

    /// Explicit targets first, then a named resource, then the inventory
    async fn fanout_targets(
        &self,
        request: &PanelRequest,
        resource_type: &ResourceType,
    ) -> TelemetryResult<Vec<ResourceIdentity>> {
        if !request.resources.is_empty() {
            return Ok(request
                .resources
                .iter()
                .map(|id| ResourceIdentity::new(id.as_str(), resource_type.clone()))
                .collect());
        }

        let names_resource = request
            .resource_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
            || request.catalog.is_some();
        match &self.inventory {
            Some(inventory) if !names_resource => {
                let listed = inventory.list(resource_type).await?;
                tracing::info!("Inventory listed {} {} resources", listed.len(), resource_type);
                Ok(listed)
            }
            _ => Ok(vec![self.resolve_identity(request, resource_type).await?]),
        }
    }

    async fn run_fanout(
        &self,
        panel: &MetricPanel,
        resource_type: &ResourceType,
        request: &PanelRequest,
        window: &TimeWindow,
        cancel: &CancellationToken,
        data: &mut PanelData,
    ) -> TelemetryResult<()> {
        let resources = self.fanout_targets(request, resource_type).await?;
        let single_series = panel.series.len() == 1;

        for series_spec in &panel.series {
            let template = series_spec.descriptor(resource_type)?;
            let result = self
                .fanout
                .execute(&template, window, &resources, cancel)
                .await?;

            for (resource, outcome) in result.into_inner() {
                let key = if single_series {
                    resource.id.clone()
                } else {
                    format!("{}/{}", series_spec.label, resource.id)
                };
                match outcome {
                    ResourceOutcome::Success { raw, series } => {
                        if let Some(statistic) = panel.summary {
                            if let Some(value) = series.summarize(statistic) {
                                data.summaries.insert(key.clone(), value);
                            }
                        }
                        data.series.insert(key.clone(), series);
                        data.raw.insert(key, RawFrame::Metric(raw));
                    }
                    ResourceOutcome::Failure(failure) => {
                        data.failures.insert(key, failure.message);
                    }
                }
            }
        }
        Ok(())
    }

    async fn run_log(
        &self,
        panel: &LogPanel,
        request: &PanelRequest,
        window: &TimeWindow,
        cancel: &CancellationToken,
        data: &mut PanelData,
    ) -> TelemetryResult<()> {
        let poller = self.poller.as_ref().ok_or_else(|| {
            TelemetryError::config_with_context(
                "no log backend configured",
                format!("running log panel '{}'", request.query_name),
            )
        })?;
        let log_group = self
            .identity
            .resolve_log_group(request.log_group.as_deref(), request.catalog.as_ref())
            .await?;

        let outcome = poller.run(&panel.query, &log_group, window, cancel).await?;
        data.records = normalize_logs(&outcome.pages);
        data.raw.insert(log_group, RawFrame::Logs(outcome.pages));
        Ok(())
    }
}
