//! Client builder

use super::TelemetryClient;
use super::factory::BackendFactory;
use skywatch_core::config::{self, EngineConfig};
use skywatch_core::resource::HttpCatalog;
use skywatch_core::{
    LogBackend, MetricBackend, ResourceCatalog, ResourceInventory, TelemetryEngine,
    TelemetryError, TelemetryResult,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Where the configuration comes from
#[derive(Debug, Clone, Default)]
enum ConfigSource {
    /// Default path plus environment overrides
    #[default]
    Ambient,
    File(PathBuf),
    Value(Box<EngineConfig>),
}

/// Fluent builder for [`TelemetryClient`].
///
/// Injected backends always win over the factory. The catalog defaults to
/// an HTTP client using the configured request timeout.
#[derive(Default)]
pub struct ClientBuilder {
    config: ConfigSource,
    metrics: Option<Arc<dyn MetricBackend>>,
    logs: Option<Arc<dyn LogBackend>>,
    catalog: Option<Arc<dyn ResourceCatalog>>,
    inventory: Option<Arc<dyn ResourceInventory>>,
    factory: Option<Arc<dyn BackendFactory>>,
    init_logging: bool,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already constructed configuration. Env overrides are not applied.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = ConfigSource::Value(Box::new(config));
        self
    }

    /// Load configuration from a JSON, TOML or YAML file, then apply env overrides
    pub fn with_config_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config = ConfigSource::File(path.into());
        self
    }

    pub fn with_metric_backend(mut self, backend: Arc<dyn MetricBackend>) -> Self {
        self.metrics = Some(backend);
        self
    }

    pub fn with_log_backend(mut self, backend: Arc<dyn LogBackend>) -> Self {
        self.logs = Some(backend);
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn ResourceCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Enumerates targets for fan-out panels that name none
    pub fn with_inventory(mut self, inventory: Arc<dyn ResourceInventory>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    /// Fallback used for any backend not injected directly
    pub fn with_backend_factory(mut self, factory: Arc<dyn BackendFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Install the tracing subscriber from the logging section on build
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.init_logging = enabled;
        self
    }

    /// Load configuration, resolve backends and build the engine
    pub fn build(self) -> TelemetryResult<TelemetryClient> {
        let config = match self.config {
            ConfigSource::Ambient => config::load_config()?,
            ConfigSource::File(path) => {
                tracing::info!("Loading SDK config from: {}", path.display());
                config::load_config_from_file(&path)?
            }
            ConfigSource::Value(config) => *config,
        };

        if self.init_logging && !skywatch_core::logging::init(&config.logging)? {
            tracing::debug!("Tracing subscriber already installed, keeping it");
        }

        let metrics = match (self.metrics, &self.factory) {
            (Some(backend), _) => backend,
            (None, Some(factory)) => {
                tracing::debug!("Constructing metric backend from factory");
                factory.metric_backend(&config)?
            }
            (None, None) => {
                return Err(TelemetryError::config_with_context(
                    "no metric backend available",
                    "inject one with with_metric_backend or supply a BackendFactory",
                ));
            }
        };

        let logs = match (self.logs, &self.factory) {
            (Some(backend), _) => Some(backend),
            (None, Some(factory)) => factory.log_backend(&config)?,
            (None, None) => None,
        };
        if logs.is_none() {
            tracing::debug!("No log backend configured; log panels are unavailable");
        }

        let catalog: Arc<dyn ResourceCatalog> = match self.catalog {
            Some(catalog) => catalog,
            None => Arc::new(HttpCatalog::new(config.catalog.request_timeout)?),
        };

        let inventory = match (self.inventory, &self.factory) {
            (Some(inventory), _) => Some(inventory),
            (None, Some(factory)) => factory.inventory(&config)?,
            (None, None) => None,
        };
        if inventory.is_none() {
            tracing::debug!("No resource inventory; fan-out panels need explicit targets");
        }

        let engine = TelemetryEngine::new(&config, metrics, logs, catalog, inventory)?;
        tracing::info!(
            "SDK client ready - {} panels, max_concurrency {}",
            engine.registry().len(),
            config.fanout.max_concurrency
        );
        Ok(TelemetryClient { config, engine })
    }
}
