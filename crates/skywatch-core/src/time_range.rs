//! Query time window resolution

use crate::error::{TelemetryError, TelemetryResult, TimeField};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::time::Duration;

/// Default lookback when the caller gives no start time
pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(5 * 60);

/// Closed-open query window. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window, rejecting empty or inverted ranges
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> TelemetryResult<Self> {
        if start >= end {
            return Err(TelemetryError::time_parse(
                TimeField::End,
                end.to_rfc3339(),
                format!("end time must be after start time {}", start.to_rfc3339()),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Window length
    pub fn duration(&self) -> Duration {
        (self.end - self.start).to_std().unwrap_or_default()
    }

    /// Start as epoch milliseconds, the unit log backends expect
    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// End as epoch milliseconds
    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }
}

/// Parses and defaults the query window. No side effects.
#[derive(Debug, Clone, Copy)]
pub struct TimeRangeResolver {
    lookback: Duration,
}

impl Default for TimeRangeResolver {
    fn default() -> Self {
        Self {
            lookback: DEFAULT_LOOKBACK,
        }
    }
}

impl TimeRangeResolver {
    pub fn new(lookback: Duration) -> Self {
        Self { lookback }
    }

    /// Resolve against the current wall clock
    pub fn resolve(&self, start: Option<&str>, end: Option<&str>) -> TelemetryResult<TimeWindow> {
        self.resolve_at(Utc::now(), start, end)
    }

    /// Resolve against a fixed `now`.
    ///
    /// Absent or blank inputs default independently: start to
    /// `now - lookback`, end to `now`. A present input must parse as RFC 3339.
    pub fn resolve_at(
        &self,
        now: DateTime<Utc>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> TelemetryResult<TimeWindow> {
        let start = match non_blank(start) {
            Some(raw) => parse_timestamp(TimeField::Start, raw)?,
            None => now
                .checked_sub_signed(self.lookback_delta()?)
                .ok_or_else(|| TelemetryError::config("lookback reaches before the earliest date"))?,
        };
        let end = match non_blank(end) {
            Some(raw) => parse_timestamp(TimeField::End, raw)?,
            None => now,
        };

        tracing::debug!("Resolved window: {} .. {}", start, end);
        TimeWindow::new(start, end)
    }

    fn lookback_delta(&self) -> TelemetryResult<ChronoDuration> {
        ChronoDuration::from_std(self.lookback)
            .map_err(|e| TelemetryError::config(format!("lookback out of range: {}", e)))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_timestamp(field: TimeField, raw: &str) -> TelemetryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| TelemetryError::time_parse(field, raw, e.to_string()))
}
