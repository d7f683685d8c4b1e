//! Skywatch SDK
//!
//! This crate provides a high-level client for running telemetry panels with
//! the Skywatch engine. It loads configuration, wires metric and log
//! backends plus the resource catalog and inventory into a
//! [`TelemetryEngine`](skywatch_core::TelemetryEngine), and exposes one-call
//! panel execution.
//!
//! Backends are injected by the caller. When none is injected the builder
//! asks a [`BackendFactory`] to construct them from ambient settings.
//!
//! # Example
//!
//! ```no_run
//! use skywatch_sdk::{PanelRequest, TelemetryClient};
//! # use std::sync::Arc;
//! # async fn example(
//! #     metrics: Arc<dyn skywatch_sdk::MetricBackend>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let client = TelemetryClient::builder()
//!     .with_config_file("skywatch.toml")
//!     .with_metric_backend(metrics)
//!     .build()?;
//!
//! let request = PanelRequest::new("cpu_utilization_panel", "EC2").with_resource_id("i-0abc");
//! let response = client.run_panel(&request).await?;
//! println!("{}", response.render(request.response_type)?);
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::{BackendFactory, ClientBuilder, TelemetryClient};

// Re-export commonly used types from core
pub use skywatch_core::{
    BackendError, CancellationToken, EngineConfig, LogBackend, MetricBackend, PanelRequest,
    PanelResponse, ResourceCatalog, ResourceInventory, ResponseType, TelemetryError,
    TelemetryResult, config::LoggingConfig, resource::CatalogRef, resource::StaticInventory,
};
