//! services/app/src/error.rs
//!
//! Defines the single result type every gateway operation returns, and the
//! top-level error for the `empathy` binary.

use crate::config::ConfigError;
use empathy_core::ports::PortError;
use empathy_core::validation::ValidationErrors;
use serde_json::Value;

pub const GENERIC_FAILURE: &str = "Something went wrong";

/// The failure branch of every gateway operation.
///
/// Transport failures and backend-reported failures land in the same type, so
/// screen logic never inspects transport exceptions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// No session token; raised before any request is built.
    #[error("unauthenticated")]
    Unauthenticated,

    /// No connectivity or the request timed out.
    #[error("Network error: {0}")]
    Network(String),

    /// Local input rules failed; nothing was sent.
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Username or password is incorrect")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    AccountExists,

    /// A well-formed failure reported by the backend.
    #[error("{message}")]
    Backend {
        status: Option<u16>,
        code: Option<String>,
        message: String,
        details: Option<Value>,
    },

    /// The on-device session could not be written or removed.
    #[error("Could not store the session: {0}")]
    Storage(String),

    /// The triggering control already has a request in flight.
    #[error("A previous request is still in progress")]
    InFlight,

    /// The action needs data the screen has not loaded; nothing was sent.
    #[error("Not loaded yet")]
    NotLoaded,
}

impl GatewayError {
    /// A backend failure carrying the backend's message, or the generic one.
    pub fn backend(status: Option<u16>, code: Option<String>, details: Option<Value>) -> Self {
        let message = code
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        GatewayError::Backend {
            status,
            code,
            message,
            details,
        }
    }

    /// A success status whose body lacked what the operation needs.
    pub fn unexpected_response(status: u16, what: &str) -> Self {
        GatewayError::Backend {
            status: Some(status),
            code: None,
            message: format!("Unexpected response from server: {}", what),
            details: None,
        }
    }

    /// User-facing text for this failure.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn details(&self) -> Option<&Value> {
        match self {
            GatewayError::Backend { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            GatewayError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<PortError> for GatewayError {
    fn from(err: PortError) -> Self {
        GatewayError::Network(err.to_string())
    }
}

impl From<ValidationErrors> for GatewayError {
    fn from(errors: ValidationErrors) -> Self {
        GatewayError::Validation(errors)
    }
}

/// A convenience type alias for `Result<T, GatewayError>`.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// The primary error type for the `empathy` binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents a failed backend operation.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use empathy_core::validation::Field;
    use serde_json::json;

    #[test]
    fn backend_message_falls_back_to_generic_text() {
        let err = GatewayError::backend(Some(500), None, None);
        assert_eq!(err.message(), GENERIC_FAILURE);
        let err = GatewayError::backend(Some(400), Some("story_too_long".into()), Some(json!({"max": 10})));
        assert_eq!(err.message(), "story_too_long");
        assert_eq!(err.details(), Some(&json!({"max": 10})));
    }

    #[test]
    fn transport_failures_become_network_errors() {
        let err: GatewayError = PortError::Timeout.into();
        assert!(matches!(err, GatewayError::Network(_)));
        assert_eq!(err.details(), None);
    }

    #[test]
    fn validation_errors_keep_their_fields() {
        let mut errors = ValidationErrors::default();
        errors.push(Field::Story, "Story cannot be empty");
        let err: GatewayError = errors.into();
        assert_eq!(err.message(), "Story cannot be empty");
        assert!(err.validation().and_then(|v| v.for_field(Field::Story)).is_some());
    }
}
