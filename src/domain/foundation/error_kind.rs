//! Error classification shared by every layer.
//!
//! Each layer has its own error type; all of them collapse into one of these
//! kinds so the HTTP adapter and the logs speak the same vocabulary.

use serde::Serialize;

/// Category of a failure, independent of which component raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No digest in the signature header matched the payload.
    InvalidSignature,

    /// Signed timestamp falls outside the tolerance window.
    StaleTimestamp,

    /// Signed payload is not a well-formed event.
    MalformedPayload,

    /// Subscription, item, customer or invoice does not exist.
    NotFound,

    /// Billing backend refused the request.
    BackendRejected,

    /// Line items of one invoice are in different currencies.
    CurrencyMismatch,

    /// Billing backend did not answer within the configured timeout.
    UpstreamTimeout,

    /// Billing backend could not be reached or answered garbage.
    UpstreamUnavailable,

    /// Caller input is malformed.
    ValidationError,
}

impl ErrorKind {
    /// Stable machine-readable name, used as a structured log field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidSignature => "invalid_signature",
            ErrorKind::StaleTimestamp => "stale_timestamp",
            ErrorKind::MalformedPayload => "malformed_payload",
            ErrorKind::NotFound => "not_found",
            ErrorKind::BackendRejected => "backend_rejected",
            ErrorKind::CurrencyMismatch => "currency_mismatch",
            ErrorKind::UpstreamTimeout => "upstream_timeout",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::ValidationError => "validation_error",
        }
    }

    /// Whether the failure was caused by the caller rather than by us or the backend.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ErrorKind::UpstreamTimeout | ErrorKind::UpstreamUnavailable
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_failures_are_not_client_errors() {
        assert!(!ErrorKind::UpstreamTimeout.is_client_error());
        assert!(!ErrorKind::UpstreamUnavailable.is_client_error());
    }

    #[test]
    fn verification_and_input_failures_are_client_errors() {
        assert!(ErrorKind::InvalidSignature.is_client_error());
        assert!(ErrorKind::StaleTimestamp.is_client_error());
        assert!(ErrorKind::MalformedPayload.is_client_error());
        assert!(ErrorKind::ValidationError.is_client_error());
        assert!(ErrorKind::BackendRejected.is_client_error());
    }

    #[test]
    fn display_uses_snake_case_name() {
        assert_eq!(ErrorKind::CurrencyMismatch.to_string(), "currency_mismatch");
        assert_eq!(
            serde_json::to_string(&ErrorKind::NotFound).unwrap(),
            "\"not_found\""
        );
    }
}
