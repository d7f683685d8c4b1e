//! Data-driven panel dispatch

pub mod definition;
pub mod registry;

pub use definition::{LogPanel, MetricPanel, PanelDefinition, PanelKind, SeriesSpec};
pub use registry::{PanelKey, PanelRegistry};
