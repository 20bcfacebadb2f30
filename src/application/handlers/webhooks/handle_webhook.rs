//! HandleWebhookHandler - verify, then dispatch, one processor delivery.

use std::sync::Arc;

use crate::domain::webhook::{WebhookError, WebhookVerifier};

use super::dispatch_event::{DispatchOutcome, EventDispatcher};

/// Command to handle a webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleWebhookCommand {
    /// Raw body exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value.
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleWebhookResult {
    pub event_id: String,
    pub event_type: String,
    pub outcome: DispatchOutcome,
}

pub struct HandleWebhookHandler {
    verifier: Arc<WebhookVerifier>,
    dispatcher: Arc<EventDispatcher>,
}

impl HandleWebhookHandler {
    pub fn new(verifier: Arc<WebhookVerifier>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            verifier,
            dispatcher,
        }
    }

    pub async fn handle(&self, cmd: HandleWebhookCommand) -> Result<HandleWebhookResult, WebhookError> {
        self.handle_at(cmd, chrono::Utc::now().timestamp()).await
    }

    /// Handles a delivery as if received at `now` (Unix seconds).
    pub async fn handle_at(
        &self,
        cmd: HandleWebhookCommand,
        now: i64,
    ) -> Result<HandleWebhookResult, WebhookError> {
        // 1. Authenticate; nothing is dispatched for an unverified body
        let event = self
            .verifier
            .verify_at(&cmd.payload, &cmd.signature, now)
            .map_err(|e| {
                tracing::warn!(error = %e, kind = %e.kind(), "Webhook verification failed");
                e
            })?;

        // 2. Dispatch
        let outcome = self.dispatcher.dispatch(&event).await.map_err(|e| {
            tracing::error!(
                event_id = %event.id,
                event_type = %event.event_type,
                error = %e,
                "Webhook dispatch failed"
            );
            e
        })?;

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            request_id = event.request.as_ref().and_then(|r| r.id()).unwrap_or_default(),
            outcome = ?outcome,
            "Webhook processed"
        );

        Ok(HandleWebhookResult {
            event_id: event.id,
            event_type: event.event_type,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fulfillment::RecordingFulfillmentNotifier;
    use crate::adapters::stripe::MockBillingBackend;
    use crate::domain::webhook::sign;
    use secrecy::SecretString;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_700_000_000;

    fn handler(mock: &MockBillingBackend) -> HandleWebhookHandler {
        let verifier = WebhookVerifier::new(SecretString::new(SECRET.to_string()));
        let dispatcher = EventDispatcher::new(
            Arc::new(mock.clone()),
            Arc::new(RecordingFulfillmentNotifier::new()),
            "Pasha e-book",
        );
        HandleWebhookHandler::new(Arc::new(verifier), Arc::new(dispatcher))
    }

    fn command(payload: &str, signature: String) -> HandleWebhookCommand {
        HandleWebhookCommand {
            payload: payload.as_bytes().to_vec(),
            signature,
        }
    }

    #[tokio::test]
    async fn verified_event_is_dispatched() {
        let payload = r#"{"id":"evt_9","type":"invoice.finalized","data":{"object":{}}}"#;
        let signature = sign(payload.as_bytes(), SECRET, NOW);

        let result = handler(&MockBillingBackend::new())
            .handle_at(command(payload, signature), NOW)
            .await
            .unwrap();

        assert_eq!(result.event_id, "evt_9");
        assert_eq!(result.event_type, "invoice.finalized");
    }

    #[tokio::test]
    async fn forged_event_is_never_dispatched() {
        let mock = MockBillingBackend::new();
        let payload = r#"{"type":"invoice.payment_succeeded","data":{"object":{"billing_reason":"subscription_create","subscription":"sub_1","payment_intent":"pi_1"}}}"#;
        let signature = sign(payload.as_bytes(), "whsec_attacker", NOW);

        let err = handler(&mock)
            .handle_at(command(payload, signature), NOW)
            .await
            .unwrap_err();

        assert_eq!(err, WebhookError::InvalidSignature);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn stale_delivery_is_rejected() {
        let payload = r#"{"type":"invoice.finalized"}"#;
        let signature = sign(payload.as_bytes(), SECRET, NOW - 600);

        let err = handler(&MockBillingBackend::new())
            .handle_at(command(payload, signature), NOW)
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::StaleTimestamp { .. }));
    }
}
