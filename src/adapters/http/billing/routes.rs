//! Axum router configuration for billing endpoints.

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    routing::{get, post},
    BoxError, Router,
};
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    cancel_subscription, create_customer, create_subscription, get_config, handle_webhook, health,
    invoice_preview, list_subscriptions, report_usage, request_timed_out,
    retrieve_customer_payment_method, retrieve_subscription_information, retry_invoice,
    update_subscription, BillingAppState,
};

/// Create the billing API router.
///
/// # Routes
///
/// - `GET /config` - Publishable key and price lookup keys
/// - `POST /create-customer` - Register a customer (sets the `customer` cookie)
/// - `POST /create-subscription` - Start a subscription
/// - `POST /cancel-subscription` - Cancel a subscription
/// - `POST /update-subscription` - Change price and/or quantity
/// - `POST /invoice-preview` - Quote a change
/// - `GET /subscriptions` - List the caller's subscriptions
/// - `POST /retry-invoice` - Retry an invoice with a new payment method
/// - `POST /retrieve-subscription-information` - Price, invoices and card of a subscription
/// - `POST /retrieve-customer-payment-method` - Card details of a payment method
/// - `POST /report-usage` - Record metered usage
/// - `GET /health` - Liveness
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/config", get(get_config))
        .route("/create-customer", post(create_customer))
        .route("/create-subscription", post(create_subscription))
        .route("/cancel-subscription", post(cancel_subscription))
        .route("/update-subscription", post(update_subscription))
        .route("/invoice-preview", post(invoice_preview))
        .route("/subscriptions", get(list_subscriptions))
        .route("/retry-invoice", post(retry_invoice))
        .route(
            "/retrieve-subscription-information",
            post(retrieve_subscription_information),
        )
        .route(
            "/retrieve-customer-payment-method",
            post(retrieve_customer_payment_method),
        )
        .route("/report-usage", post(report_usage))
        .route("/health", get(health))
}

/// Create the webhook router.
///
/// Separate from the billing routes because deliveries carry no customer
/// identity; they are authenticated by signature.
///
/// # Routes
/// - `POST /webhook` - Verify and dispatch a processor event
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/webhook", post(handle_webhook))
}

/// Create the complete service with tracing, timeout and CORS layers.
///
/// A request cut off by `request_timeout` gets the usual error envelope with
/// status 504.
pub fn router(state: BillingAppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let timeout = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(move |err: BoxError| {
            request_timed_out(err, request_timeout)
        }))
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .merge(billing_routes())
        .merge(webhook_routes())
        .layer(timeout)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use tower::ServiceExt;

    use crate::adapters::fulfillment::RecordingFulfillmentNotifier;
    use crate::adapters::stripe::MockBillingBackend;
    use crate::domain::billing::PriceCatalog;
    use crate::domain::webhook::WebhookVerifier;

    fn app(mock: MockBillingBackend) -> Router {
        let state = BillingAppState {
            backend: Arc::new(mock),
            catalog: Arc::new(PriceCatalog::new([("basic", "price_basic")])),
            verifier: Arc::new(WebhookVerifier::new(SecretString::new(
                "whsec_test".to_string(),
            ))),
            fulfillment: Arc::new(RecordingFulfillmentNotifier::new()),
            add_on_name: "Pasha e-book".to_string(),
            publishable_key: "pk_test_123".to_string(),
        };
        router(state, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app(MockBillingBackend::new())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = app(MockBillingBackend::new())
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn webhook_requires_post() {
        let response = app(MockBillingBackend::new())
            .oneshot(Request::builder().uri("/webhook").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn malformed_json_gets_error_envelope() {
        let response = app(MockBillingBackend::new())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/update-subscription")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["error"]["message"].is_string());
    }
}
