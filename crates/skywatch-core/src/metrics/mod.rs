//! Metric queries: descriptors, single execution and concurrent fan-out

pub mod backend;
pub mod descriptor;
pub mod executor;
pub mod fanout;

pub use backend::{
    MetricBackend, MetricDataOutput, MetricDataQuery, MetricDataRequest, MetricDataResult,
};
pub use descriptor::{DEFAULT_PERIOD, Dimension, QueryDescriptor, QueryDescriptorBuilder, Statistic};
pub use executor::MetricQueryExecutor;
pub use fanout::{
    AggregatedResult, ConcurrentFanoutExecutor, FailureKind, QueryFailure, ResourceOutcome,
};
