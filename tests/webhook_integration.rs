//! Integration tests for webhook intake.
//!
//! Signs payloads with the shared secret, posts them to `/webhook` and checks
//! both the response and the side effects on the backend and notifier.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use storefront_billing::adapters::fulfillment::RecordingFulfillmentNotifier;
use storefront_billing::adapters::http::{router, BillingAppState};
use storefront_billing::adapters::stripe::MockBillingBackend;
use storefront_billing::domain::billing::PriceCatalog;
use storefront_billing::domain::webhook::{sign, WebhookVerifier};
use storefront_billing::ports::PaymentIntent;

// =============================================================================
// Test Infrastructure
// =============================================================================

const SECRET: &str = "whsec_integration";
const OLD_SECRET: &str = "whsec_previous";
const ADD_ON: &str = "Pasha e-book";

struct Harness {
    backend: MockBillingBackend,
    notifier: RecordingFulfillmentNotifier,
}

impl Harness {
    fn new() -> Self {
        let backend =
            MockBillingBackend::with_active_subscription("cus_1", "sub_1", "price_basic", 1, 1000);
        backend.add_payment_intent(PaymentIntent {
            id: "pi_1".to_string(),
            status: "succeeded".to_string(),
            payment_method: Some("pm_card".to_string()),
            client_secret: None,
        });
        Self {
            backend,
            notifier: RecordingFulfillmentNotifier::new(),
        }
    }

    fn app(&self) -> Router {
        let verifier = WebhookVerifier::new(SecretString::new(SECRET.to_string()))
            .with_secret(SecretString::new(OLD_SECRET.to_string()));
        let state = BillingAppState {
            backend: Arc::new(self.backend.clone()),
            catalog: Arc::new(PriceCatalog::new([("basic", "price_basic")])),
            verifier: Arc::new(verifier),
            fulfillment: Arc::new(self.notifier.clone()),
            add_on_name: ADD_ON.to_string(),
            publishable_key: "pk_test_123".to_string(),
        };
        router(state, Duration::from_secs(5))
    }

    async fn deliver(&self, payload: &[u8], signature: Option<String>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("POST").uri("/webhook");
        if let Some(signature) = signature {
            builder = builder.header("Stripe-Signature", signature);
        }
        let request = builder.body(Body::from(payload.to_vec())).unwrap();

        let response = self.app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn first_invoice_paid() -> Vec<u8> {
    json!({
        "id": "evt_invoice",
        "type": "invoice.payment_succeeded",
        "request": {"id": "req_1", "idempotency_key": null},
        "data": {"object": {
            "id": "in_1",
            "billing_reason": "subscription_create",
            "customer": "cus_1",
            "subscription": "sub_1",
            "payment_intent": "pi_1"
        }}
    })
    .to_string()
    .into_bytes()
}

fn checkout_completed(item: &str) -> Vec<u8> {
    json!({
        "id": "evt_checkout",
        "type": "checkout.session.completed",
        "data": {"object": {
            "id": "cs_1",
            "customer": "cus_1",
            "display_items": [{"custom": {"name": item}}]
        }}
    })
    .to_string()
    .into_bytes()
}

// =============================================================================
// Verification
// =============================================================================

#[tokio::test]
async fn valid_delivery_is_acknowledged() {
    let harness = Harness::new();
    let payload = first_invoice_paid();

    let (status, body) = harness
        .deliver(&payload, Some(sign(&payload, SECRET, now())))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"received": true}));
}

#[tokio::test]
async fn rotated_secret_is_still_accepted() {
    let harness = Harness::new();
    let payload = first_invoice_paid();

    let (status, _) = harness
        .deliver(&payload, Some(sign(&payload, OLD_SECRET, now())))
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn tampered_body_is_rejected_without_side_effects() {
    let harness = Harness::new();
    let payload = first_invoice_paid();
    let signature = sign(&payload, SECRET, now());
    let mut tampered = payload.clone();
    let last = tampered.len() - 2;
    tampered[last] ^= 0x01;

    let (status, body) = harness.deliver(&tampered, Some(signature)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].is_string());
    assert_eq!(harness.backend.write_count(), 0);
    assert!(!harness.backend.was_called("get_payment_intent"));
}

#[tokio::test]
async fn stale_timestamp_is_rejected() {
    let harness = Harness::new();
    let payload = first_invoice_paid();

    let (status, _) = harness
        .deliver(&payload, Some(sign(&payload, SECRET, now() - 301)))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(harness.backend.write_count(), 0);
}

#[tokio::test]
async fn wrong_secret_is_rejected() {
    let harness = Harness::new();
    let payload = first_invoice_paid();

    let (status, _) = harness
        .deliver(&payload, Some(sign(&payload, "whsec_attacker", now())))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let harness = Harness::new();

    let (status, _) = harness.deliver(&first_invoice_paid(), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signed_garbage_is_malformed_payload() {
    let harness = Harness::new();
    let payload = b"not json at all".to_vec();

    let (status, _) = harness
        .deliver(&payload, Some(sign(&payload, SECRET, now())))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Dispatch
// =============================================================================

#[tokio::test]
async fn first_invoice_sets_subscription_default_payment_method() {
    let harness = Harness::new();
    let payload = first_invoice_paid();

    harness
        .deliver(&payload, Some(sign(&payload, SECRET, now())))
        .await;

    let subscription = harness.backend.subscription("sub_1").unwrap();
    assert_eq!(subscription.default_payment_method.as_deref(), Some("pm_card"));
}

#[tokio::test]
async fn default_payment_method_failure_is_still_acknowledged() {
    let harness = Harness::new();
    harness.backend.set_method_error(
        "set_subscription_default_payment_method",
        storefront_billing::ports::BackendError::rejected("No such payment method"),
    );
    let payload = first_invoice_paid();

    let (status, _) = harness
        .deliver(&payload, Some(sign(&payload, SECRET, now())))
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn add_on_checkout_notifies_fulfillment() {
    let harness = Harness::new();
    let payload = checkout_completed(ADD_ON);

    let (status, _) = harness
        .deliver(&payload, Some(sign(&payload, SECRET, now())))
        .await;

    assert_eq!(status, StatusCode::OK);
    let requests = harness.notifier.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].customer_id.as_deref(), Some("cus_1"));
    assert_eq!(requests[0].item_name, ADD_ON);
}

#[tokio::test]
async fn other_checkout_items_do_not_notify() {
    let harness = Harness::new();
    let payload = checkout_completed("Sticker pack");

    let (status, _) = harness
        .deliver(&payload, Some(sign(&payload, SECRET, now())))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(harness.notifier.requests().is_empty());
}

#[tokio::test]
async fn fulfillment_outage_asks_for_redelivery() {
    let harness = Harness::new();
    harness.notifier.fail_with("mail relay down");
    let payload = checkout_completed(ADD_ON);

    let (status, _) = harness
        .deliver(&payload, Some(sign(&payload, SECRET, now())))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unknown_event_type_has_no_side_effects() {
    let harness = Harness::new();
    let payload = br#"{"id":"evt_x","type":"customer.tax_id.updated","data":{"object":{}}}"#;

    let (status, _) = harness
        .deliver(payload, Some(sign(payload, SECRET, now())))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(harness.backend.write_count(), 0);
    assert!(harness.notifier.requests().is_empty());
}
