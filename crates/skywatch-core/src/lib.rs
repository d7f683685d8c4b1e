//! Skywatch Core Library
//!
//! This crate provides the telemetry query engine for Skywatch: resource
//! identity resolution, time windows, metric queries with concurrent fan-out,
//! asynchronous log-search polling, result normalization and panel dispatch.

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod logs;
pub mod metrics;
pub mod normalize;
pub mod output;
pub mod panels;
pub mod recovery;
pub mod resource;
pub mod time_range;

// Re-export commonly used types
pub use backend::BackendError;
pub use config::{EngineConfig, FanoutConfig, PollerConfig};
pub use engine::{PanelRequest, TelemetryEngine};
pub use error::{TelemetryError, TelemetryResult, UnifiedError};
pub use logs::{LogBackend, LogQueryPoller};
pub use metrics::{
    AggregatedResult, ConcurrentFanoutExecutor, MetricBackend, MetricQueryExecutor,
    QueryDescriptor, Statistic,
};
pub use normalize::{DataPoint, LogRecord, TimeSeries};
pub use output::{PanelResponse, ResponseType};
pub use panels::{PanelDefinition, PanelRegistry};
pub use resource::{ResourceCatalog, ResourceIdentity, ResourceInventory, ResourceType};
pub use time_range::{TimeRangeResolver, TimeWindow};

// Re-export so backend implementors don't need a direct dependency
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
