//! Asynchronous log-search queries

pub mod backend;
pub mod poller;
pub mod query;

pub use backend::{
    BackendQueryStatus, LogBackend, QueryId, QueryResultsPage, QueryStatistics, ResultField,
    StartQueryRequest,
};
pub use poller::{LogQueryOutcome, LogQueryPoller};
pub use query::{LogQuery, LogQueryState};
