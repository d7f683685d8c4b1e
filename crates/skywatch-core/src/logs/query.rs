//! Log query lifecycle

use super::backend::QueryId;
use crate::time_range::TimeWindow;
use serde::Serialize;
use std::fmt;

/// Lifecycle of a log query as tracked by the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogQueryState {
    Submitted,
    Running,
    Complete,
    Failed,
    Timeout,
}

impl LogQueryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Timeout)
    }

    /// Whether the lifecycle permits moving to `next`
    pub fn can_transition_to(&self, next: LogQueryState) -> bool {
        use LogQueryState::*;
        matches!(
            (self, next),
            (Submitted, Running)
                | (Submitted, Failed)
                | (Submitted, Timeout)
                | (Running, Complete)
                | (Running, Failed)
                | (Running, Timeout)
        )
    }
}

impl fmt::Display for LogQueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submitted => "submitted",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// A log-search query and where it is in its lifecycle
#[derive(Debug, Clone, Serialize)]
pub struct LogQuery {
    pub query_string: String,
    pub log_group: String,
    pub window: TimeWindow,
    pub id: Option<QueryId>,
    state: LogQueryState,
}

impl LogQuery {
    pub fn new(
        query_string: impl Into<String>,
        log_group: impl Into<String>,
        window: TimeWindow,
    ) -> Self {
        Self {
            query_string: query_string.into(),
            log_group: log_group.into(),
            window,
            id: None,
            state: LogQueryState::Submitted,
        }
    }

    pub fn state(&self) -> LogQueryState {
        self.state
    }

    /// Move to `next`; illegal transitions are ignored and reported
    pub(crate) fn transition(&mut self, next: LogQueryState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                "Ignoring log query transition {} -> {}",
                self.state,
                next
            );
            return false;
        }
        tracing::debug!("Log query {} -> {}", self.state, next);
        self.state = next;
        true
    }

    pub(crate) fn id_string(&self) -> String {
        self.id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "<unsubmitted>".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn query() -> LogQuery {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 11, 55, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        LogQuery::new(
            "fields @message",
            "/aws/ecs/prod",
            TimeWindow::new(start, end).unwrap(),
        )
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut q = query();
        assert_eq!(q.state(), LogQueryState::Submitted);
        assert!(q.transition(LogQueryState::Running));
        assert!(q.transition(LogQueryState::Complete));
        assert!(q.state().is_terminal());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut q = query();
        q.transition(LogQueryState::Running);
        q.transition(LogQueryState::Timeout);
        assert!(!q.transition(LogQueryState::Complete));
        assert_eq!(q.state(), LogQueryState::Timeout);
    }

    #[test]
    fn test_cannot_complete_before_running() {
        let mut q = query();
        assert!(!q.transition(LogQueryState::Complete));
        assert_eq!(q.id_string(), "<unsubmitted>");
    }
}
