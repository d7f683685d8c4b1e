//! Bounded concurrent fan-out of one metric query across many resources

use super::backend::MetricDataOutput;
use super::descriptor::QueryDescriptor;
use super::executor::MetricQueryExecutor;
use crate::config::FanoutConfig;
use crate::error::{TelemetryError, TelemetryResult, UnifiedError};
use crate::normalize::{TimeSeries, normalize_metric};
use crate::resource::ResourceIdentity;
use crate::time_range::TimeWindow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Why a resource produced no data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The backend rejected or failed the query
    Query,
    /// Cancelled or past the fan-out deadline before finishing
    Cancelled,
    /// The task ended without reporting
    Aborted,
}

/// Per-resource failure recorded in an [`AggregatedResult`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFailure {
    pub kind: FailureKind,
    pub message: String,
    pub retryable: bool,
}

impl QueryFailure {
    fn from_error(error: &TelemetryError) -> Self {
        Self {
            kind: FailureKind::Query,
            message: error.to_string(),
            retryable: error.is_retryable(),
        }
    }

    fn cancelled(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Cancelled,
            message: message.into(),
            retryable: true,
        }
    }

    fn aborted(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Aborted,
            message: message.into(),
            retryable: false,
        }
    }
}

/// Outcome for one resource
#[derive(Debug, Clone)]
pub enum ResourceOutcome {
    Success {
        raw: MetricDataOutput,
        series: TimeSeries,
    },
    Failure(QueryFailure),
}

impl ResourceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn series(&self) -> Option<&TimeSeries> {
        match self {
            Self::Success { series, .. } => Some(series),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&QueryFailure> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

/// Merged fan-out results keyed by resource. Unordered.
#[derive(Debug, Clone, Default)]
pub struct AggregatedResult {
    outcomes: HashMap<ResourceIdentity, ResourceOutcome>,
}

impl AggregatedResult {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, resource: &ResourceIdentity) -> Option<&ResourceOutcome> {
        self.outcomes.get(resource)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceIdentity, &ResourceOutcome)> {
        self.outcomes.iter()
    }

    pub fn successes(&self) -> impl Iterator<Item = (&ResourceIdentity, &TimeSeries)> {
        self.outcomes
            .iter()
            .filter_map(|(resource, outcome)| outcome.series().map(|s| (resource, s)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&ResourceIdentity, &QueryFailure)> {
        self.outcomes
            .iter()
            .filter_map(|(resource, outcome)| outcome.failure().map(|f| (resource, f)))
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    pub fn into_inner(self) -> HashMap<ResourceIdentity, ResourceOutcome> {
        self.outcomes
    }
}

/// Runs one query template against many resources with bounded concurrency
#[derive(Clone)]
pub struct ConcurrentFanoutExecutor {
    executor: MetricQueryExecutor,
    config: FanoutConfig,
}

impl ConcurrentFanoutExecutor {
    pub fn new(executor: MetricQueryExecutor, config: FanoutConfig) -> Self {
        Self { executor, config }
    }

    pub fn config(&self) -> &FanoutConfig {
        &self.config
    }

    /// Query every resource and merge the outcomes.
    ///
    /// Returns only after every spawned task has reported. Fails only when
    /// every resource failed; partial failures stay in the result.
    #[instrument(
        skip_all,
        fields(metric = template.metric_name(), resources = resources.len()),
        level = "debug"
    )]
    pub async fn execute(
        &self,
        template: &QueryDescriptor,
        window: &TimeWindow,
        resources: &[ResourceIdentity],
        cancel: &CancellationToken,
    ) -> TelemetryResult<AggregatedResult> {
        let targets = dedupe(resources);
        if targets.is_empty() {
            tracing::debug!("Fan-out called with no resources");
            return Ok(AggregatedResult::default());
        }

        let max_concurrency = self.config.max_concurrency.max(1);
        let permits = Arc::new(Semaphore::new(max_concurrency));
        // A deadline past the clock's range is no deadline at all
        let deadline = self
            .config
            .deadline
            .and_then(|d| Instant::now().checked_add(d));
        let (tx, mut rx) = mpsc::channel(targets.len());

        tracing::info!(
            "Fanning out {} over {} resources (max {} in flight)",
            template.metric_name(),
            targets.len(),
            max_concurrency
        );

        let mut handles = Vec::with_capacity(targets.len());
        for resource in targets {
            let task = FanoutTask {
                executor: self.executor.clone(),
                descriptor: template.bind(&resource),
                window: *window,
                resource: resource.clone(),
                permits: permits.clone(),
                cancel: cancel.clone(),
                deadline,
            };
            let tx = tx.clone();
            let handle = tokio::spawn(async move {
                let (resource, outcome) = task.run().await;
                let _ = tx.send((resource, outcome)).await;
            });
            handles.push((resource, handle));
        }
        drop(tx);

        let mut outcomes = HashMap::with_capacity(handles.len());
        while let Some((resource, outcome)) = rx.recv().await {
            outcomes.insert(resource, outcome);
        }

        let joined = futures::future::join_all(
            handles
                .into_iter()
                .map(|(resource, handle)| async move { (resource, handle.await) }),
        )
        .await;
        for (resource, joined) in joined {
            if outcomes.contains_key(&resource) {
                continue;
            }
            let message = match joined {
                Err(e) => format!("task ended without result: {}", e),
                Ok(()) => "task ended without result".to_string(),
            };
            tracing::warn!("Fan-out task for {} died: {}", resource, message);
            outcomes.insert(resource, ResourceOutcome::Failure(QueryFailure::aborted(message)));
        }

        let result = AggregatedResult { outcomes };
        for (resource, failure) in result.failures() {
            tracing::warn!("Query for {} failed: {}", resource, failure.message);
        }
        tracing::info!(
            "Fan-out finished: {} succeeded, {} failed",
            result.success_count(),
            result.failure_count()
        );

        if result.success_count() == 0 {
            if cancel.is_cancelled() {
                return Err(TelemetryError::Cancelled);
            }
            let mut failures: Vec<(String, String)> = result
                .failures()
                .map(|(resource, failure)| (resource.id.clone(), failure.message.clone()))
                .collect();
            failures.sort();
            return Err(TelemetryError::FanoutExhausted {
                attempted: result.len(),
                failures,
            });
        }

        Ok(result)
    }
}

struct FanoutTask {
    executor: MetricQueryExecutor,
    descriptor: QueryDescriptor,
    window: TimeWindow,
    resource: ResourceIdentity,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl FanoutTask {
    async fn run(self) -> (ResourceIdentity, ResourceOutcome) {
        let deadline = self.deadline;
        let deadline_reached = async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                ResourceOutcome::Failure(QueryFailure::cancelled("cancelled before completion"))
            }
            _ = deadline_reached => {
                ResourceOutcome::Failure(QueryFailure::cancelled("fan-out deadline exceeded"))
            }
            outcome = self.query() => outcome,
        };
        (self.resource, outcome)
    }

    async fn query(&self) -> ResourceOutcome {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(e) => return ResourceOutcome::Failure(QueryFailure::aborted(e.to_string())),
        };

        match self
            .executor
            .execute(&self.descriptor, &self.window, &self.resource)
            .await
        {
            Ok(raw) => {
                let series = normalize_metric(&raw);
                ResourceOutcome::Success { raw, series }
            }
            Err(e) => ResourceOutcome::Failure(QueryFailure::from_error(&e)),
        }
    }
}

fn dedupe(resources: &[ResourceIdentity]) -> Vec<ResourceIdentity> {
    let mut seen = HashSet::with_capacity(resources.len());
    let mut unique = Vec::with_capacity(resources.len());
    for resource in resources {
        if seen.insert(resource) {
            unique.push(resource.clone());
        } else {
            tracing::warn!("Duplicate resource {} in fan-out, querying once", resource);
        }
    }
    unique
}
