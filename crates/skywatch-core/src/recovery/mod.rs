//! Failure classification and backoff
//!
//! The engine never retries a metric query itself; it classifies backend
//! failures so callers can decide. The log poller uses the backoff
//! strategies here to space out its status polls.

pub mod backoff;

pub use backoff::{BackoffConfig, ExponentialBackoff};

use crate::backend::BackendError;

/// Error classification for recovery decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient errors that may succeed on retry
    Transient,
    /// Permanent errors that will not succeed on retry
    Permanent,
    /// Unknown errors
    Unknown,
}

const TRANSIENT_CODES: &[&str] = &[
    "throttling",
    "throttlingexception",
    "requestlimitexceeded",
    "limitexceededexception",
    "serviceunavailable",
    "internalfailure",
    "requesttimeout",
];

const PERMANENT_CODES: &[&str] = &[
    "accessdenied",
    "accessdeniedexception",
    "invalidparametervalue",
    "invalidparametercombination",
    "missingparameter",
    "resourcenotfoundexception",
    "malformedqueryexception",
    "unrecognizedclientexception",
];

/// Classify a backend failure into an error class
pub fn classify_backend_error(error: &BackendError) -> ErrorClass {
    if let Some(code) = &error.code {
        let code = code.to_ascii_lowercase();
        if TRANSIENT_CODES.contains(&code.as_str()) {
            return ErrorClass::Transient;
        }
        if PERMANENT_CODES.contains(&code.as_str()) {
            return ErrorClass::Permanent;
        }
    }

    match error.status_code {
        Some(429) | Some(500..=599) => return ErrorClass::Transient,
        Some(400..=499) => return ErrorClass::Permanent,
        _ => {}
    }

    let msg = error.message.to_lowercase();
    if msg.contains("timeout")
        || msg.contains("timed out")
        || msg.contains("connection reset")
        || msg.contains("connection refused")
        || msg.contains("rate exceeded")
    {
        ErrorClass::Transient
    } else if msg.contains("not authorized") || msg.contains("invalid") {
        ErrorClass::Permanent
    } else {
        ErrorClass::Unknown
    }
}
