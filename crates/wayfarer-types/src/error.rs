//! Unified error type for the control plane core.
//!
//! Every crate-local error eventually folds into [`CoreError`] so that a
//! single `status_hint()` call tells an adapter (REST/gRPC/WS/MCP) which
//! transport-level code to use, without the core knowing anything about
//! transports.

use thiserror::Error;

/// Result type alias used throughout the core.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// A coarse-grained classification an adapter maps to its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    Timeout,
    ResourceExhausted,
    CircuitOpen,
    UpstreamUnavailable,
    ElementNotFound,
    NavigationFailed,
    EvaluationFailed,
    InteractionFailed,
    FileFailed,
    SecurityViolation,
    Internal,
}

/// Transport-agnostic status family; adapters pick their own numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusHint {
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    AlreadyExists,
    ResourceExhausted,
    Unavailable,
    Internal,
}

/// Tagged error value carrying a message, optional structured details and a
/// correlation id, matching spec.md §7.
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct CoreError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub correlation_id: Option<String>,
}

impl CoreError {
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            correlation_id: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_correlation_id<S: Into<String>>(mut self, id: S) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn resource_exhausted<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::ResourceExhausted, message)
    }

    pub fn circuit_open<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::CircuitOpen, message)
    }

    pub fn security_violation<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::SecurityViolation, message)
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Non-retryable kinds per spec.md §4.6's classifier table.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self.kind,
            ErrorKind::SecurityViolation
                | ErrorKind::Forbidden
                | ErrorKind::Unauthenticated
                | ErrorKind::InvalidInput
                | ErrorKind::NotFound
        )
    }

    /// The status-code family an adapter would map this to (spec.md §6's
    /// table); the numeric/textual mapping itself stays in the adapter.
    pub fn status_hint(&self) -> StatusHint {
        match self.kind {
            ErrorKind::InvalidInput => StatusHint::InvalidArgument,
            ErrorKind::Unauthenticated => StatusHint::Unauthenticated,
            ErrorKind::Forbidden => StatusHint::PermissionDenied,
            ErrorKind::NotFound => StatusHint::NotFound,
            ErrorKind::Conflict => StatusHint::AlreadyExists,
            ErrorKind::ResourceExhausted => StatusHint::ResourceExhausted,
            ErrorKind::CircuitOpen | ErrorKind::UpstreamUnavailable => StatusHint::Unavailable,
            ErrorKind::Timeout
            | ErrorKind::ElementNotFound
            | ErrorKind::NavigationFailed
            | ErrorKind::EvaluationFailed
            | ErrorKind::InteractionFailed
            | ErrorKind::FileFailed
            | ErrorKind::SecurityViolation
            | ErrorKind::Internal => StatusHint::Internal,
        }
    }

    /// Human label an adapter shows as `ActionResult.error`.
    pub fn label(&self) -> &'static str {
        match self.kind {
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::Unauthenticated => "Unauthenticated",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::ResourceExhausted => "ResourceExhausted",
            ErrorKind::CircuitOpen => "CircuitOpen",
            ErrorKind::UpstreamUnavailable => "UpstreamUnavailable",
            ErrorKind::ElementNotFound => "ElementNotFound",
            ErrorKind::NavigationFailed => "NavigationFailed",
            ErrorKind::EvaluationFailed => "EvaluationFailed",
            ErrorKind::InteractionFailed => "InteractionFailed",
            ErrorKind::FileFailed => "FileFailed",
            ErrorKind::SecurityViolation => "SecurityViolation",
            ErrorKind::Internal => "Internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_violations_never_retry() {
        let e = CoreError::security_violation("eval( blocked");
        assert!(!e.is_retryable());
    }

    #[test]
    fn timeouts_are_retryable() {
        let e = CoreError::timeout("deadline exceeded");
        assert!(e.is_retryable());
    }

    #[test]
    fn circuit_open_maps_to_unavailable() {
        let e = CoreError::circuit_open("breaker tripped");
        assert_eq!(e.status_hint(), StatusHint::Unavailable);
    }
}
