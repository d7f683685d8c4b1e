//! Backend construction when the caller injects none

use skywatch_core::config::EngineConfig;
use skywatch_core::{LogBackend, MetricBackend, ResourceInventory, TelemetryResult};
use std::sync::Arc;

/// Builds backends from ambient settings (credentials, region, endpoints).
///
/// Implementations live with the provider SDK integration. The client only
/// calls a factory for backends that were not injected directly.
pub trait BackendFactory: Send + Sync {
    /// Metric backend for the given configuration
    fn metric_backend(&self, config: &EngineConfig) -> TelemetryResult<Arc<dyn MetricBackend>>;

    /// Log backend, if the provider offers one
    fn log_backend(&self, _config: &EngineConfig) -> TelemetryResult<Option<Arc<dyn LogBackend>>> {
        Ok(None)
    }

    /// Resource inventory for fan-out enumeration, if the provider offers one
    fn inventory(
        &self,
        _config: &EngineConfig,
    ) -> TelemetryResult<Option<Arc<dyn ResourceInventory>>> {
        Ok(None)
    }
}
