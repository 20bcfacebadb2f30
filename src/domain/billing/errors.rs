//! Errors raised while computing or applying subscription changes.

use thiserror::Error;

use crate::domain::foundation::ErrorKind;

/// Failure of a billing operation.
///
/// Messages are user-visible. `BackendRejected` carries the backend's text
/// verbatim; correlation identifiers never end up in here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("{0}")]
    BackendRejected(String),

    #[error("Invoice mixes currencies: expected {expected}, found {found}")]
    CurrencyMismatch { expected: String, found: String },

    #[error("Billing backend timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Billing backend unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
}

impl BillingError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        BillingError::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        BillingError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::NotFound { .. } => ErrorKind::NotFound,
            BillingError::BackendRejected(_) => ErrorKind::BackendRejected,
            BillingError::CurrencyMismatch { .. } => ErrorKind::CurrencyMismatch,
            BillingError::UpstreamTimeout(_) => ErrorKind::UpstreamTimeout,
            BillingError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            BillingError::Validation { .. } => ErrorKind::ValidationError,
        }
    }
}
