//! Signed-payload verification for processor webhooks.
//!
//! Header: `t=<unix>,v1=<hex>[,v1=<hex>...]`. The digest is HMAC-SHA256 over
//! `"{t}.{raw_body}"`. Several `v1` values and several secrets may be present
//! while a secret is being rotated; any match authenticates the request.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;
use super::event::Event;

/// Default tolerance between the signed timestamp and now (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Parsed components of the signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp the processor signed.
    pub timestamp: i64,
    /// Every `v1` digest present, in header order.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a signature header. Keys other than `t` and `v1` are ignored, as
    /// are empty parts, parts without `=` and `v1` values that are not hex.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::MalformedHeader` if the timestamp does not
    /// decode, or no `t` or no decodable `v1` remains.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::MalformedHeader("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    if let Ok(digest) = hex::decode(value) {
                        v1_signatures.push(digest);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| WebhookError::MalformedHeader("missing timestamp".to_string()))?;
        if v1_signatures.is_empty() {
            return Err(WebhookError::MalformedHeader(
                "missing v1 signature".to_string(),
            ));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Authenticates webhook deliveries against one or more shared secrets.
#[derive(Clone)]
pub struct WebhookVerifier {
    secrets: Vec<SecretString>,
    tolerance_secs: u64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secrets", &self.secrets.len())
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl WebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secrets: vec![secret],
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Accepts an additional secret, e.g. the new one during rotation.
    pub fn with_secret(mut self, secret: SecretString) -> Self {
        self.secrets.push(secret);
        self
    }

    pub fn with_tolerance(mut self, tolerance_secs: u64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    pub fn tolerance_secs(&self) -> u64 {
        self.tolerance_secs
    }

    /// Verifies against the system clock.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<Event, WebhookError> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    /// Verifies the delivery and parses the event.
    ///
    /// # Verification Steps
    ///
    /// 1. Parse the signature header
    /// 2. Match any `v1` digest against any secret (constant time)
    /// 3. Check `|now - t|` against the tolerance
    /// 4. Parse the JSON payload into an `Event`
    ///
    /// # Errors
    ///
    /// - `MalformedHeader` - header could not be parsed
    /// - `InvalidSignature` - no digest matched
    /// - `StaleTimestamp` - outside the tolerance window
    /// - `MalformedPayload` - body is not an event
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<Event, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        let matched = self.secrets.iter().any(|secret| {
            let expected = compute_signature(secret.expose_secret(), header.timestamp, payload);
            header
                .v1_signatures
                .iter()
                .any(|candidate| constant_time_compare(&expected, candidate))
        });
        if !matched {
            return Err(WebhookError::InvalidSignature);
        }

        let age_secs = now.saturating_sub(header.timestamp);
        if age_secs.unsigned_abs() > self.tolerance_secs {
            return Err(WebhookError::StaleTimestamp {
                age_secs,
                tolerance_secs: self.tolerance_secs,
            });
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::MalformedPayload(e.to_string()))
    }
}

/// HMAC-SHA256 of `"{timestamp}.{payload}"`.
fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Builds a signature header the way the processor does.
///
/// Used by tests and by local tooling that replays events.
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(compute_signature(secret, timestamp, payload))
    )
}
