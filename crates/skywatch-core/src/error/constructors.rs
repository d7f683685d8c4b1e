//! Constructor methods for TelemetryError

use super::types::{TelemetryError, TimeField};
use crate::recovery::ErrorClass;

impl TelemetryError {
    /// Create a time parse error for one side of the window
    pub fn time_parse(
        field: TimeField,
        input: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::TimeParse {
            field,
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create an identity resolution error
    pub fn identity(message: impl Into<String>) -> Self {
        Self::IdentityResolution {
            message: message.into(),
            element_id: None,
            context: None,
        }
    }

    /// Create an identity resolution error for a catalog element
    pub fn identity_for_element(message: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self::IdentityResolution {
            message: message.into(),
            element_id: Some(element_id.into()),
            context: None,
        }
    }

    /// Create a metric query error for a resource
    pub fn metric_query(
        resource: impl Into<String>,
        message: impl Into<String>,
        class: ErrorClass,
    ) -> Self {
        Self::MetricQuery {
            message: message.into(),
            resource: Some(resource.into()),
            class,
            context: None,
        }
    }

    /// Create a log query error
    pub fn log_query(message: impl Into<String>) -> Self {
        Self::LogQuery {
            message: message.into(),
            query_id: None,
            context: None,
        }
    }

    /// Create a log query error tied to a backend query id
    pub fn log_query_with_id(message: impl Into<String>, query_id: impl Into<String>) -> Self {
        Self::LogQuery {
            message: message.into(),
            query_id: Some(query_id.into()),
            context: None,
        }
    }

    /// Create an unknown panel error
    pub fn unknown_panel(query_name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self::UnknownPanel {
            query_name: query_name.into(),
            resource_type: resource_type.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new HTTP error
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
            url: None,
            status_code: None,
            context: None,
        }
    }

    /// Create an HTTP error with status code and url
    pub fn http_status(message: impl Into<String>, url: impl Into<String>, status_code: u16) -> Self {
        Self::Http {
            message: message.into(),
            url: Some(url.into()),
            status_code: Some(status_code),
            context: None,
        }
    }

    /// Create a new JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
            context: None,
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
            context: None,
        }
    }

    /// Create an invalid input error with field
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
            context: None,
        }
    }

    /// Attach context to an error in place, keeping the variant
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        let ctx = Some(ctx.into());
        match &mut self {
            Self::IdentityResolution { context, .. }
            | Self::MetricQuery { context, .. }
            | Self::LogQuery { context, .. }
            | Self::Config { context, .. }
            | Self::Http { context, .. }
            | Self::Json { context, .. }
            | Self::InvalidInput { context, .. } => *context = ctx,
            _ => {}
        }
        self
    }
}
