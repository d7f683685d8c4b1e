//! SDK client implementation

mod builder;
mod factory;
mod run;

pub use builder::ClientBuilder;
pub use factory::BackendFactory;

use skywatch_core::config::EngineConfig;
use skywatch_core::panels::PanelKey;
use skywatch_core::TelemetryEngine;

/// High-level client for running telemetry panels.
///
/// Built through [`ClientBuilder`]; holds a ready engine and the
/// configuration it was built from. Cloning is cheap and clones share
/// backends.
///
/// # Examples
///
/// ```no_run
/// use skywatch_sdk::{PanelRequest, TelemetryClient};
/// # use std::sync::Arc;
///
/// # async fn example(
/// #     metrics: Arc<dyn skywatch_sdk::MetricBackend>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let client = TelemetryClient::builder()
///     .with_metric_backend(metrics)
///     .build()?;
///
/// let json = client
///     .run_panel_rendered(&PanelRequest::new("cpu_utilization_panel", "EC2").with_resource_id("i-1"))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TelemetryClient {
    pub(crate) config: EngineConfig,
    pub(crate) engine: TelemetryEngine,
}

impl TelemetryClient {
    /// Start building a client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Configuration the engine was built from
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn engine(&self) -> &TelemetryEngine {
        &self.engine
    }

    /// Registered panels, sorted
    pub fn panels(&self) -> Vec<PanelKey> {
        self.engine.registry().keys()
    }
}
