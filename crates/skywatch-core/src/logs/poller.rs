//! Submit-then-poll driver for asynchronous log queries

use super::backend::{BackendQueryStatus, LogBackend, QueryId, QueryResultsPage, StartQueryRequest};
use super::query::{LogQuery, LogQueryState};
use crate::config::PollerConfig;
use crate::error::{TelemetryError, TelemetryResult};
use crate::normalize::{LogRecord, normalize_logs};
use crate::recovery::ExponentialBackoff;
use crate::time_range::TimeWindow;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep, sleep_until, timeout};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Upper bound for the best-effort stop request after giving up, and for
/// an interrupted submission to report its id
const STOP_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Stand-in deadline when the configured one does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A completed query with every page received while polling
#[derive(Debug, Clone)]
pub struct LogQueryOutcome {
    pub query: LogQuery,
    pub pages: Vec<QueryResultsPage>,
}

impl LogQueryOutcome {
    /// Rows from the complete pages
    pub fn records(&self) -> Vec<LogRecord> {
        normalize_logs(&self.pages)
    }
}

/// Drives a [`LogQuery`] from submission to a terminal state
#[derive(Clone)]
pub struct LogQueryPoller {
    backend: Arc<dyn LogBackend>,
    config: PollerConfig,
}

enum Interrupt {
    Cancelled,
    Deadline,
}

impl LogQueryPoller {
    pub fn new(backend: Arc<dyn LogBackend>, config: PollerConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Submit `query_string` against `log_group` and poll until it finishes.
    ///
    /// Backend failures end the query with a `LogQuery` error. Hitting the
    /// deadline or cancellation stops the backend query and yields
    /// `PollTimeout`.
    #[instrument(skip(self, query_string, window, cancel), level = "debug")]
    pub async fn run(
        &self,
        query_string: &str,
        log_group: &str,
        window: &TimeWindow,
        cancel: &CancellationToken,
    ) -> TelemetryResult<LogQueryOutcome> {
        let started = Instant::now();
        let deadline = started
            .checked_add(self.config.deadline)
            .unwrap_or_else(|| started + FAR_FUTURE);
        let mut query = LogQuery::new(query_string, log_group, *window);
        if cancel.is_cancelled() {
            return Err(self.abandon(&mut query, Interrupt::Cancelled, started).await);
        }

        let request = StartQueryRequest {
            log_group_name: log_group.to_string(),
            query_string: query_string.to_string(),
            start_time: window.start(),
            end_time: window.end(),
        };

        let submit = self.backend.start_query(&request);
        tokio::pin!(submit);
        let interrupted = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Interrupt::Cancelled),
            _ = sleep_until(deadline) => Err(Interrupt::Deadline),
            result = &mut submit => Ok(result),
        };
        let submitted = match interrupted {
            Ok(result) => result,
            Err(interrupt) => {
                // The backend may already hold the query; wait for its id so it can be stopped
                match timeout(STOP_QUERY_TIMEOUT, &mut submit).await {
                    Ok(Ok(id)) => query.id = Some(id),
                    Ok(Err(e)) => tracing::debug!("Interrupted submission failed: {}", e),
                    Err(_) => tracing::warn!(
                        "Interrupted submission on {} did not return an id in {:?}",
                        log_group,
                        STOP_QUERY_TIMEOUT
                    ),
                }
                return Err(self.abandon(&mut query, interrupt, started).await);
            }
        };
        let query_id = match submitted {
            Ok(id) => id,
            Err(e) => {
                query.transition(LogQueryState::Failed);
                return Err(TelemetryError::log_query(format!("failed to submit query: {}", e))
                    .with_context(format!("log group '{}'", log_group)));
            }
        };

        tracing::info!("Submitted log query {} on {}", query_id, log_group);
        query.id = Some(query_id.clone());
        query.transition(LogQueryState::Running);

        let mut backoff = ExponentialBackoff::with_config(self.config.backoff_config());
        let mut pages = Vec::new();

        loop {
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(self.abandon(&mut query, Interrupt::Cancelled, started).await);
                }
                _ = sleep_until(deadline) => {
                    return Err(self.abandon(&mut query, Interrupt::Deadline, started).await);
                }
                result = self.backend.get_query_results(&query_id) => result,
            };
            let page = match polled {
                Ok(page) => page,
                Err(e) => {
                    query.transition(LogQueryState::Failed);
                    return Err(TelemetryError::log_query_with_id(
                        format!("failed to fetch query results: {}", e),
                        query_id.as_str(),
                    ));
                }
            };

            let status = page.status;
            tracing::debug!(
                "Log query {} status {} ({} rows)",
                query_id,
                status,
                page.rows.len()
            );
            pages.push(page);

            match status {
                BackendQueryStatus::Complete => {
                    query.transition(LogQueryState::Complete);
                    tracing::info!(
                        "Log query {} complete after {} polls in {:?}",
                        query_id,
                        pages.len(),
                        started.elapsed()
                    );
                    return Ok(LogQueryOutcome { query, pages });
                }
                status if status.is_pending() => {
                    let delay = backoff.next_delay();
                    tracing::debug!("Query not complete, polling again in {:?}", delay);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Err(self.abandon(&mut query, Interrupt::Cancelled, started).await);
                        }
                        _ = sleep_until(deadline) => {
                            return Err(self.abandon(&mut query, Interrupt::Deadline, started).await);
                        }
                        _ = sleep(delay) => {}
                    }
                }
                status => {
                    query.transition(LogQueryState::Failed);
                    return Err(TelemetryError::log_query_with_id(
                        format!("query ended with status {}", status),
                        query_id.as_str(),
                    ));
                }
            }
        }
    }

    async fn abandon(
        &self,
        query: &mut LogQuery,
        interrupt: Interrupt,
        started: Instant,
    ) -> TelemetryError {
        let elapsed = started.elapsed();
        query.transition(LogQueryState::Timeout);
        match interrupt {
            Interrupt::Cancelled => {
                tracing::info!("Log query {} cancelled after {:?}", query.id_string(), elapsed)
            }
            Interrupt::Deadline => tracing::warn!(
                "Log query {} exceeded deadline of {:?}",
                query.id_string(),
                self.config.deadline
            ),
        }

        if let Some(id) = &query.id {
            self.stop(id).await;
        }

        TelemetryError::PollTimeout {
            query_id: query.id_string(),
            elapsed,
        }
    }

    async fn stop(&self, query_id: &QueryId) {
        match timeout(STOP_QUERY_TIMEOUT, self.backend.stop_query(query_id)).await {
            Ok(Ok(())) => tracing::debug!("Stopped log query {}", query_id),
            Ok(Err(e)) => tracing::warn!("Failed to stop log query {}: {}", query_id, e),
            Err(_) => tracing::warn!("Timed out stopping log query {}", query_id),
        }
    }
}
