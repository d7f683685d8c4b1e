//! Error types for the telemetry engine
//!
//! Every fallible operation in the engine returns [`TelemetryResult`]. All
//! variants implement the [`UnifiedError`] trait which provides:
//! - error_code: A stable identifier for programmatic handling
//! - message: Human-readable error message
//! - context: Optional additional context about where the error occurred

mod constructors;
mod conversions;
mod types;
mod user_messages;

pub use types::{TelemetryError, TelemetryResult, TimeField, UnifiedError};
pub use user_messages::{ErrorCategory, UserFriendlyError};
