//! Failures while authenticating or handling a payment-processor event.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::ErrorKind;

/// Errors that occur during webhook processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// No `v1` digest matched any configured secret.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature header could not be parsed.
    #[error("Invalid signature header: {0}")]
    MalformedHeader(String),

    /// Signed timestamp is further than the tolerance from now, in either direction.
    #[error("Timestamp outside tolerance: {age_secs}s old, tolerance {tolerance_secs}s")]
    StaleTimestamp { age_secs: i64, tolerance_secs: u64 },

    /// Authentic body that is not a well-formed event.
    #[error("Malformed event payload: {0}")]
    MalformedPayload(String),

    /// A required side effect failed; the processor should redeliver.
    #[error("Event dispatch failed: {0}")]
    DispatchFailed(String),
}

impl WebhookError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WebhookError::InvalidSignature | WebhookError::MalformedHeader(_) => {
                ErrorKind::InvalidSignature
            }
            WebhookError::StaleTimestamp { .. } => ErrorKind::StaleTimestamp,
            WebhookError::MalformedPayload(_) => ErrorKind::MalformedPayload,
            WebhookError::DispatchFailed(_) => ErrorKind::UpstreamUnavailable,
        }
    }

    /// Returns true if the processor should retry delivering this event.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::DispatchFailed(_))
    }

    /// Maps the error to an HTTP status code.
    ///
    /// 4xx stops redelivery, 5xx asks for it.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature
            | WebhookError::MalformedHeader(_)
            | WebhookError::StaleTimestamp { .. }
            | WebhookError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::DispatchFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_header_is_an_invalid_signature() {
        let err = WebhookError::MalformedHeader("missing timestamp".to_string());
        assert_eq!(err.kind(), ErrorKind::InvalidSignature);
        assert_eq!(err.to_string(), "Invalid signature header: missing timestamp");
    }

    #[test]
    fn verification_failures_are_bad_requests() {
        for err in [
            WebhookError::InvalidSignature,
            WebhookError::MalformedHeader("x".to_string()),
            WebhookError::StaleTimestamp {
                age_secs: 301,
                tolerance_secs: 300,
            },
            WebhookError::MalformedPayload("x".to_string()),
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn dispatch_failure_asks_for_redelivery() {
        let err = WebhookError::DispatchFailed("fulfillment unavailable".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_retryable());
    }

    #[test]
    fn stale_timestamp_kind() {
        let err = WebhookError::StaleTimestamp {
            age_secs: -400,
            tolerance_secs: 300,
        };
        assert_eq!(err.kind(), ErrorKind::StaleTimestamp);
    }
}
