//! EventDispatcher - routes verified processor events to their reconciliation step.
//!
//! Every handler is idempotent and order-insensitive: events are not
//! deduplicated, so the same event may arrive twice or out of order.

use std::sync::Arc;

use crate::domain::webhook::{CheckoutCompletion, Event, EventPayload, InvoicePayment, WebhookError};
use crate::ports::{BillingBackend, FulfillmentNotifier, FulfillmentRequest};

/// What dispatching an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// New subscription's default payment method set from its first payment.
    DefaultPaymentMethodSet {
        subscription_id: String,
        payment_method_id: String,
    },

    /// Best-effort default payment method step did not complete. Logged only.
    DefaultPaymentMethodSkipped { reason: String },

    /// Fulfillment was asked to deliver the add-on.
    FulfillmentNotified { item_name: String },

    /// Event needs no action.
    Acknowledged { event_type: String },
}

pub struct EventDispatcher {
    backend: Arc<dyn BillingBackend>,
    fulfillment: Arc<dyn FulfillmentNotifier>,
    add_on_name: String,
}

impl EventDispatcher {
    pub fn new(
        backend: Arc<dyn BillingBackend>,
        fulfillment: Arc<dyn FulfillmentNotifier>,
        add_on_name: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            fulfillment,
            add_on_name: add_on_name.into(),
        }
    }

    /// Dispatches an authenticated event.
    ///
    /// # Errors
    ///
    /// - `MalformedPayload` if a handled type carries the wrong object shape
    /// - `DispatchFailed` if fulfillment could not be notified
    pub async fn dispatch(&self, event: &Event) -> Result<DispatchOutcome, WebhookError> {
        match event.payload()? {
            EventPayload::InvoicePaid(invoice) if invoice.is_subscription_create() => {
                Ok(self.set_default_payment_method(&invoice).await)
            }
            EventPayload::CheckoutCompleted(session) => self.notify_fulfillment(event, session).await,
            _ => Ok(DispatchOutcome::Acknowledged {
                event_type: event.event_type.clone(),
            }),
        }
    }

    /// Makes the first invoice's payment method the subscription default.
    ///
    /// Failures never fail the event; the subscription still works, it just
    /// charges through the customer's default instead.
    async fn set_default_payment_method(&self, invoice: &InvoicePayment) -> DispatchOutcome {
        match self.try_set_default_payment_method(invoice).await {
            Ok(outcome) => outcome,
            Err(reason) => {
                tracing::warn!(
                    invoice_id = invoice.invoice_id.as_deref().unwrap_or_default(),
                    reason = %reason,
                    "Could not set subscription default payment method"
                );
                DispatchOutcome::DefaultPaymentMethodSkipped { reason }
            }
        }
    }

    async fn try_set_default_payment_method(
        &self,
        invoice: &InvoicePayment,
    ) -> Result<DispatchOutcome, String> {
        let subscription_id = invoice
            .subscription_id
            .as_deref()
            .ok_or("invoice has no subscription")?;
        let payment_intent_id = invoice
            .payment_intent_id
            .as_deref()
            .ok_or("invoice has no payment intent")?;

        let payment_intent = self
            .backend
            .get_payment_intent(payment_intent_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("payment intent {} not found", payment_intent_id))?;
        let payment_method_id = payment_intent
            .payment_method
            .ok_or("payment intent has no payment method")?;

        self.backend
            .set_subscription_default_payment_method(subscription_id, &payment_method_id)
            .await
            .map_err(|e| e.to_string())?;

        tracing::info!(
            subscription_id,
            payment_method_id = %payment_method_id,
            "Default payment method set"
        );

        Ok(DispatchOutcome::DefaultPaymentMethodSet {
            subscription_id: subscription_id.to_string(),
            payment_method_id,
        })
    }

    async fn notify_fulfillment(
        &self,
        event: &Event,
        session: CheckoutCompletion,
    ) -> Result<DispatchOutcome, WebhookError> {
        if self.add_on_name.is_empty() || !session.contains_item(&self.add_on_name) {
            return Ok(DispatchOutcome::Acknowledged {
                event_type: event.event_type.clone(),
            });
        }

        self.fulfillment
            .notify(FulfillmentRequest {
                customer_id: session.customer_id,
                checkout_session_id: session.session_id,
                item_name: self.add_on_name.clone(),
            })
            .await
            .map_err(|e| WebhookError::DispatchFailed(e.to_string()))?;

        Ok(DispatchOutcome::FulfillmentNotified {
            item_name: self.add_on_name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fulfillment::RecordingFulfillmentNotifier;
    use crate::adapters::stripe::MockBillingBackend;
    use crate::ports::{BackendError, PaymentIntent};
    use serde_json::json;

    const ADD_ON: &str = "Pasha e-book";

    fn event(event_type: &str, object: serde_json::Value) -> Event {
        serde_json::from_value(json!({
            "id": "evt_1",
            "type": event_type,
            "data": { "object": object }
        }))
        .unwrap()
    }

    fn first_invoice_paid() -> Event {
        event(
            "invoice.payment_succeeded",
            json!({
                "id": "in_1",
                "billing_reason": "subscription_create",
                "subscription": "sub_1",
                "payment_intent": "pi_1"
            }),
        )
    }

    fn setup() -> (MockBillingBackend, RecordingFulfillmentNotifier, EventDispatcher) {
        let mock = MockBillingBackend::with_active_subscription("cus_1", "sub_1", "price_a", 1, 1000);
        mock.add_payment_intent(PaymentIntent {
            id: "pi_1".to_string(),
            status: "succeeded".to_string(),
            payment_method: Some("pm_1".to_string()),
            client_secret: None,
        });
        let notifier = RecordingFulfillmentNotifier::new();
        let dispatcher =
            EventDispatcher::new(Arc::new(mock.clone()), Arc::new(notifier.clone()), ADD_ON);
        (mock, notifier, dispatcher)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Invoice payment
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn first_payment_sets_subscription_default() {
        let (mock, _, dispatcher) = setup();

        let outcome = dispatcher.dispatch(&first_invoice_paid()).await.unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::DefaultPaymentMethodSet {
                subscription_id: "sub_1".to_string(),
                payment_method_id: "pm_1".to_string(),
            }
        );
        assert_eq!(
            mock.subscription("sub_1").unwrap().default_payment_method.as_deref(),
            Some("pm_1")
        );
    }

    #[tokio::test]
    async fn invoice_paid_alias_is_handled_the_same() {
        let (_, _, dispatcher) = setup();
        let mut event = first_invoice_paid();
        event.event_type = "invoice.paid".to_string();

        let outcome = dispatcher.dispatch(&event).await.unwrap();

        assert!(matches!(outcome, DispatchOutcome::DefaultPaymentMethodSet { .. }));
    }

    #[tokio::test]
    async fn redelivered_event_is_idempotent() {
        let (mock, _, dispatcher) = setup();

        let first = dispatcher.dispatch(&first_invoice_paid()).await.unwrap();
        let second = dispatcher.dispatch(&first_invoice_paid()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            mock.subscription("sub_1").unwrap().default_payment_method.as_deref(),
            Some("pm_1")
        );
    }

    #[tokio::test]
    async fn backend_failure_is_skipped_not_raised() {
        let (mock, _, dispatcher) = setup();
        mock.set_method_error(
            "set_subscription_default_payment_method",
            BackendError::network("connection reset"),
        );

        let outcome = dispatcher.dispatch(&first_invoice_paid()).await.unwrap();

        assert!(matches!(outcome, DispatchOutcome::DefaultPaymentMethodSkipped { .. }));
    }

    #[tokio::test]
    async fn missing_payment_intent_is_skipped() {
        let (_, _, dispatcher) = setup();
        let event = event(
            "invoice.payment_succeeded",
            json!({ "billing_reason": "subscription_create", "subscription": "sub_1" }),
        );

        let outcome = dispatcher.dispatch(&event).await.unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::DefaultPaymentMethodSkipped {
                reason: "invoice has no payment intent".to_string()
            }
        );
    }

    #[tokio::test]
    async fn renewal_invoice_is_acknowledged_without_writes() {
        let (mock, _, dispatcher) = setup();
        let event = event(
            "invoice.paid",
            json!({ "billing_reason": "subscription_cycle", "subscription": "sub_1", "payment_intent": "pi_1" }),
        );

        let outcome = dispatcher.dispatch(&event).await.unwrap();

        assert!(matches!(outcome, DispatchOutcome::Acknowledged { .. }));
        assert_eq!(mock.write_count(), 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Checkout
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn checkout_with_add_on_notifies_fulfillment() {
        let (_, notifier, dispatcher) = setup();
        let event = event(
            "checkout.session.completed",
            json!({ "id": "cs_1", "customer": "cus_1", "display_items": [{ "custom": { "name": ADD_ON } }] }),
        );

        let outcome = dispatcher.dispatch(&event).await.unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::FulfillmentNotified {
                item_name: ADD_ON.to_string()
            }
        );
        let requests = notifier.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].customer_id.as_deref(), Some("cus_1"));
    }

    #[tokio::test]
    async fn checkout_without_add_on_is_acknowledged() {
        let (_, notifier, dispatcher) = setup();
        let event = event(
            "checkout.session.completed",
            json!({ "id": "cs_1", "line_items": { "data": [{ "description": "Something else" }] } }),
        );

        let outcome = dispatcher.dispatch(&event).await.unwrap();

        assert!(matches!(outcome, DispatchOutcome::Acknowledged { .. }));
        assert!(notifier.requests().is_empty());
    }

    #[tokio::test]
    async fn fulfillment_failure_asks_for_redelivery() {
        let (_, notifier, dispatcher) = setup();
        notifier.fail_with("warehouse offline");
        let event = event(
            "checkout.session.completed",
            json!({ "display_items": [{ "custom": { "name": ADD_ON } }] }),
        );

        let err = dispatcher.dispatch(&event).await.unwrap_err();

        assert!(err.is_retryable());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Everything else
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unknown_event_type_has_no_side_effects() {
        let (mock, notifier, dispatcher) = setup();
        let event: Event = serde_json::from_str(r#"{"type":"unknown.future.event"}"#).unwrap();

        let outcome = dispatcher.dispatch(&event).await.unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Acknowledged {
                event_type: "unknown.future.event".to_string()
            }
        );
        assert!(mock.calls().is_empty());
        assert!(notifier.requests().is_empty());
    }

    #[tokio::test]
    async fn informational_events_are_acknowledged() {
        let (mock, _, dispatcher) = setup();
        for event_type in [
            "invoice.payment_failed",
            "invoice.finalized",
            "customer.subscription.deleted",
            "customer.subscription.trial_will_end",
        ] {
            let outcome = dispatcher
                .dispatch(&event(event_type, json!({ "id": "obj_1" })))
                .await
                .unwrap();
            assert!(matches!(outcome, DispatchOutcome::Acknowledged { .. }));
        }
        assert!(mock.calls().is_empty());
    }
}
