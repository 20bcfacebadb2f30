//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::handlers::billing::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, ChangeMode, ChangeSubscriptionCommand,
    CreateCustomerCommand, CreateCustomerHandler, CreateSubscriptionCommand,
    CreateSubscriptionHandler, ListSubscriptionsHandler, ListSubscriptionsQuery,
    PreviewInvoiceHandler, PreviewInvoiceQuery, ReportUsageCommand, ReportUsageHandler,
    RetrievePaymentMethodHandler, RetrievePaymentMethodQuery, RetryInvoiceCommand,
    RetryInvoiceHandler, SubscriptionChangeCoordinator, SubscriptionInformationHandler,
    SubscriptionInformationQuery,
};
use crate::application::handlers::webhooks::{
    EventDispatcher, HandleWebhookCommand, HandleWebhookHandler,
};
use crate::domain::billing::{BillingError, PriceCatalog};
use crate::domain::foundation::ErrorKind;
use crate::domain::webhook::{WebhookError, WebhookVerifier};
use crate::ports::{BillingBackend, FulfillmentNotifier};

use super::dto::{
    CancelSubscriptionRequest, ConfigResponse, CreateCustomerRequest, CreateSubscriptionRequest,
    CreateSubscriptionResponse, CustomerPaymentMethodRequest, CustomerResponse, ErrorResponse,
    HealthResponse, InvoicePreviewRequest, InvoicePreviewResponse, InvoiceResponse,
    ListSubscriptionsParams, PaymentMethodResponse, ReportUsageRequest, RetryInvoiceRequest,
    SubscriptionInformationRequest, SubscriptionInformationResponse, SubscriptionResponse,
    SubscriptionsResponse, UpdateSubscriptionRequest, UsageRecordResponse, WebhookAck,
};

/// Cookie that carries the storefront customer id between requests.
pub const CUSTOMER_COOKIE: &str = "customer";

/// Header carrying the processor's webhook signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct BillingAppState {
    pub backend: Arc<dyn BillingBackend>,
    pub catalog: Arc<PriceCatalog>,
    pub verifier: Arc<WebhookVerifier>,
    pub fulfillment: Arc<dyn FulfillmentNotifier>,

    /// Checkout line item name that triggers a fulfillment notification.
    pub add_on_name: String,

    /// Publishable key handed to the browser client.
    pub publishable_key: String,
}

impl BillingAppState {
    pub fn create_customer_handler(&self) -> CreateCustomerHandler {
        CreateCustomerHandler::new(self.backend.clone())
    }

    pub fn create_subscription_handler(&self) -> CreateSubscriptionHandler {
        CreateSubscriptionHandler::new(self.backend.clone(), self.catalog.clone())
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(self.backend.clone())
    }

    pub fn change_coordinator(&self) -> SubscriptionChangeCoordinator {
        SubscriptionChangeCoordinator::new(self.backend.clone(), self.catalog.clone())
    }

    pub fn preview_invoice_handler(&self) -> PreviewInvoiceHandler {
        PreviewInvoiceHandler::new(self.backend.clone(), self.catalog.clone())
    }

    pub fn list_subscriptions_handler(&self) -> ListSubscriptionsHandler {
        ListSubscriptionsHandler::new(self.backend.clone())
    }

    pub fn retry_invoice_handler(&self) -> RetryInvoiceHandler {
        RetryInvoiceHandler::new(self.backend.clone())
    }

    pub fn subscription_information_handler(&self) -> SubscriptionInformationHandler {
        SubscriptionInformationHandler::new(self.backend.clone())
    }

    pub fn retrieve_payment_method_handler(&self) -> RetrievePaymentMethodHandler {
        RetrievePaymentMethodHandler::new(self.backend.clone())
    }

    pub fn report_usage_handler(&self) -> ReportUsageHandler {
        ReportUsageHandler::new(self.backend.clone())
    }

    pub fn webhook_handler(&self) -> HandleWebhookHandler {
        let dispatcher = EventDispatcher::new(
            self.backend.clone(),
            self.fulfillment.clone(),
            self.add_on_name.clone(),
        );
        HandleWebhookHandler::new(self.verifier.clone(), Arc::new(dispatcher))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Customer Identity
// ════════════════════════════════════════════════════════════════════════════════

/// Customer the caller acts as, read from the `customer` cookie.
///
/// Authentication is out of scope; the cookie is set by `/create-customer`
/// and an explicit `customerId` in the request body takes precedence.
#[derive(Debug, Clone, Default)]
pub struct CustomerIdentity {
    pub cookie_customer_id: Option<String>,
}

impl CustomerIdentity {
    /// Picks the explicit id if given, otherwise the cookie.
    pub fn resolve(&self, explicit: Option<String>) -> Result<String, BillingError> {
        explicit
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .or_else(|| self.cookie_customer_id.clone())
            .ok_or_else(|| BillingError::validation("customerId", "no customer for this request"))
    }
}

fn customer_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CUSTOMER_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl<S> axum::extract::FromRequestParts<S> for CustomerIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            Ok(CustomerIdentity {
                cookie_customer_id: customer_from_cookies(&parts.headers),
            })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /config - Publishable key and the price lookup keys on offer
pub async fn get_config(State(state): State<BillingAppState>) -> impl IntoResponse {
    Json(ConfigResponse {
        publishable_key: state.publishable_key.clone(),
        prices: state
            .catalog
            .lookup_keys()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

/// GET /subscriptions - The caller's subscriptions, any status
pub async fn list_subscriptions(
    State(state): State<BillingAppState>,
    identity: CustomerIdentity,
    Query(params): Query<ListSubscriptionsParams>,
) -> Result<impl IntoResponse, BillingApiError> {
    let customer_id = identity.resolve(params.customer_id)?;

    let subscriptions = state
        .list_subscriptions_handler()
        .handle(ListSubscriptionsQuery { customer_id })
        .await?;

    Ok(Json(SubscriptionsResponse {
        subscriptions: subscriptions.into_iter().map(Into::into).collect(),
    }))
}

/// GET /health - Liveness
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /create-customer - Register a customer and remember it in a cookie
pub async fn create_customer(
    State(state): State<BillingAppState>,
    payload: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let Json(request) = payload?;

    let customer = state
        .create_customer_handler()
        .handle(CreateCustomerCommand {
            email: request.email,
            name: request.name,
        })
        .await?;

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        CUSTOMER_COOKIE, customer.id
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(CustomerResponse {
            customer: customer.into(),
        }),
    ))
}

/// POST /create-subscription - Start a subscription awaiting first payment
pub async fn create_subscription(
    State(state): State<BillingAppState>,
    identity: CustomerIdentity,
    payload: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let Json(request) = payload?;
    let customer_id = identity.resolve(request.customer_id)?;

    let result = state
        .create_subscription_handler()
        .handle(CreateSubscriptionCommand {
            customer_id,
            price_lookup_key: request.price_lookup_key,
            quantity: request.quantity,
            idempotency_key: request.idempotency_key,
        })
        .await?;

    Ok(Json(CreateSubscriptionResponse {
        subscription_id: result.subscription.id,
        client_secret: result.client_secret,
    }))
}

/// POST /cancel-subscription - Cancel immediately
pub async fn cancel_subscription(
    State(state): State<BillingAppState>,
    payload: Result<Json<CancelSubscriptionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let Json(request) = payload?;

    let subscription = state
        .cancel_subscription_handler()
        .handle(CancelSubscriptionCommand {
            subscription_id: request.subscription_id,
        })
        .await?;

    Ok(Json(SubscriptionResponse {
        subscription: subscription.into(),
    }))
}

/// POST /update-subscription - Change price and/or quantity
pub async fn update_subscription(
    State(state): State<BillingAppState>,
    payload: Result<Json<UpdateSubscriptionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let Json(request) = payload?;

    let result = state
        .change_coordinator()
        .apply_change(
            ChangeSubscriptionCommand {
                subscription_id: request.subscription_id,
                new_price_lookup_key: request.new_price_lookup_key,
                quantity: request.quantity,
                idempotency_key: request.idempotency_key,
            },
            ChangeMode::Commit,
        )
        .await?;

    Ok(Json(SubscriptionResponse {
        subscription: result.subscription.into(),
    }))
}

/// POST /invoice-preview - Quote a change without applying it
pub async fn invoice_preview(
    State(state): State<BillingAppState>,
    identity: CustomerIdentity,
    payload: Result<Json<InvoicePreviewRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let Json(request) = payload?;

    // A new-subscription quote needs a customer; a change quote does not
    let customer_id = match request.subscription_id {
        Some(_) => request.customer_id,
        None => identity.resolve(request.customer_id).ok(),
    };

    let result = state
        .preview_invoice_handler()
        .handle(PreviewInvoiceQuery {
            subscription_id: request.subscription_id,
            customer_id,
            new_price_lookup_key: request.new_price_lookup_key,
            quantity: request.quantity,
        })
        .await?;

    Ok(Json(InvoicePreviewResponse::new(
        result.proration,
        result.invoice,
    )))
}

/// POST /retry-invoice - Pay an open invoice with a new payment method
pub async fn retry_invoice(
    State(state): State<BillingAppState>,
    identity: CustomerIdentity,
    payload: Result<Json<RetryInvoiceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let Json(request) = payload?;
    let customer_id = identity.resolve(request.customer_id)?;

    let invoice = state
        .retry_invoice_handler()
        .handle(RetryInvoiceCommand {
            customer_id,
            payment_method_id: request.payment_method_id,
            invoice_id: request.invoice_id,
        })
        .await?;

    Ok(Json(InvoiceResponse {
        invoice: invoice.into(),
    }))
}

/// POST /retrieve-subscription-information - Price, invoices and card for one subscription
pub async fn retrieve_subscription_information(
    State(state): State<BillingAppState>,
    payload: Result<Json<SubscriptionInformationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let Json(request) = payload?;

    let info = state
        .subscription_information_handler()
        .handle(SubscriptionInformationQuery {
            subscription_id: request.subscription_id,
        })
        .await?;

    Ok(Json(SubscriptionInformationResponse::from(info)))
}

/// POST /retrieve-customer-payment-method - Card details of a saved payment method
pub async fn retrieve_customer_payment_method(
    State(state): State<BillingAppState>,
    identity: CustomerIdentity,
    payload: Result<Json<CustomerPaymentMethodRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let Json(request) = payload?;

    let payment_method = state
        .retrieve_payment_method_handler()
        .handle(RetrievePaymentMethodQuery {
            payment_method_id: request.payment_method_id,
            customer_id: identity.resolve(None).ok(),
        })
        .await?;

    Ok(Json(PaymentMethodResponse {
        payment_method: payment_method.into(),
    }))
}

/// POST /report-usage - Record metered usage on a subscription item
pub async fn report_usage(
    State(state): State<BillingAppState>,
    payload: Result<Json<ReportUsageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BillingApiError> {
    let Json(request) = payload?;

    let record = state
        .report_usage_handler()
        .handle(ReportUsageCommand {
            subscription_item_id: request.subscription_item_id,
            quantity: request.quantity,
            timestamp: request.timestamp,
            action: request.action,
            idempotency_key: request.idempotency_key,
        })
        .await?;

    Ok(Json(UsageRecordResponse {
        usage_record: record.into(),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Handler
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhook - Verify and dispatch a processor event
///
/// The body is taken as raw bytes; the signature covers them exactly.
pub async fn handle_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| WebhookError::MalformedHeader("missing Stripe-Signature header".to_string()))?;

    let cmd = HandleWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    state.webhook_handler().handle(cmd).await?;

    Ok(Json(WebhookAck { received: true }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for BillingApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(BillingError::validation("request body", rejection.body_text()))
    }
}

/// Status code for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
        ErrorKind::InvalidSignature
        | ErrorKind::StaleTimestamp
        | ErrorKind::MalformedPayload
        | ErrorKind::ValidationError
        | ErrorKind::CurrencyMismatch
        | ErrorKind::BackendRejected => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let kind = self.0.kind();
        let status = status_for(kind);

        if kind.is_client_error() {
            tracing::info!(kind = %kind, error = %self.0, "Billing request rejected");
        } else {
            tracing::error!(kind = %kind, error = %self.0, "Billing backend failure");
        }

        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}

/// Response for a request the router's timeout cut off.
///
/// Rendered as an upstream timeout: the only slow work behind a handler is
/// the billing backend.
pub async fn request_timed_out(
    err: axum::BoxError,
    request_timeout: Duration,
) -> axum::response::Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        return BillingApiError::from(BillingError::UpstreamTimeout(format!(
            "request did not complete within {}s",
            request_timeout.as_secs()
        )))
        .into_response();
    }

    tracing::error!(error = %err, "Unhandled middleware error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
        .into_response()
}

/// API error type for webhook deliveries.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorResponse::new(self.0.to_string());
        (self.0.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use secrecy::SecretString;

    use crate::adapters::fulfillment::RecordingFulfillmentNotifier;
    use crate::adapters::stripe::MockBillingBackend;

    fn state_with(mock: MockBillingBackend) -> BillingAppState {
        BillingAppState {
            backend: Arc::new(mock),
            catalog: Arc::new(PriceCatalog::new([("basic", "price_basic")])),
            verifier: Arc::new(WebhookVerifier::new(SecretString::new(
                "whsec_test".to_string(),
            ))),
            fulfillment: Arc::new(RecordingFulfillmentNotifier::new()),
            add_on_name: "Pasha e-book".to_string(),
            publishable_key: "pk_test_123".to_string(),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Customer Identity
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn cookie_customer_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; customer=cus_42; lang=en"),
        );
        assert_eq!(customer_from_cookies(&headers).as_deref(), Some("cus_42"));
    }

    #[test]
    fn empty_customer_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("customer="));
        assert!(customer_from_cookies(&headers).is_none());
    }

    #[test]
    fn explicit_customer_id_wins_over_cookie() {
        let identity = CustomerIdentity {
            cookie_customer_id: Some("cus_cookie".to_string()),
        };
        assert_eq!(
            identity.resolve(Some("cus_body".to_string())).unwrap(),
            "cus_body"
        );
        assert_eq!(identity.resolve(None).unwrap(), "cus_cookie");
    }

    #[test]
    fn missing_identity_is_a_validation_error() {
        let err = CustomerIdentity::default().resolve(Some("  ".to_string())).unwrap_err();
        assert!(matches!(err, BillingError::Validation { field: "customerId", .. }));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Mapping
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn error_kinds_map_to_status_codes() {
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::BackendRejected), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::CurrencyMismatch), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::UpstreamTimeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(ErrorKind::UpstreamUnavailable), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn backend_rejection_message_reaches_caller_unmodified() {
        let response = BillingApiError::from(BillingError::BackendRejected(
            "Your card was declined.".to_string(),
        ))
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "Your card was declined.");
    }

    #[tokio::test]
    async fn router_timeout_renders_error_envelope_as_504() {
        let response = request_timed_out(
            Box::new(tower::timeout::error::Elapsed::new()),
            Duration::from_secs(30),
        )
        .await;

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let json = body_json(response).await;
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("within 30s"));
    }

    #[tokio::test]
    async fn webhook_verification_failure_is_400() {
        let response = WebhookApiError::from(WebhookError::InvalidSignature).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Handlers
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn create_customer_sets_cookie() {
        let mock = MockBillingBackend::new();
        let response = create_customer(
            State(state_with(mock.clone())),
            Ok(Json(CreateCustomerRequest {
                email: "jenny@example.com".to_string(),
                name: None,
            })),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("customer=cus_mock_"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn list_subscriptions_without_identity_is_400() {
        let response = list_subscriptions(
            State(state_with(MockBillingBackend::new())),
            CustomerIdentity::default(),
            Query(ListSubscriptionsParams::default()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhook_without_signature_header_is_400() {
        let mock = MockBillingBackend::new();
        let response = handle_webhook(
            State(state_with(mock.clone())),
            HeaderMap::new(),
            axum::body::Bytes::from_static(b"{}"),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(mock.write_count(), 0);
    }

    #[tokio::test]
    async fn payment_method_of_cookie_customer_only() {
        let mock = MockBillingBackend::new();
        mock.add_payment_method(crate::ports::PaymentMethod {
            id: "pm_1".to_string(),
            method_type: "card".to_string(),
            customer_id: Some("cus_owner".to_string()),
            card: None,
        });
        let request = || {
            Ok(Json(CustomerPaymentMethodRequest {
                payment_method_id: "pm_1".to_string(),
            }))
        };

        let other = retrieve_customer_payment_method(
            State(state_with(mock.clone())),
            CustomerIdentity {
                cookie_customer_id: Some("cus_other".to_string()),
            },
            request(),
        )
        .await
        .into_response();
        assert_eq!(other.status(), StatusCode::NOT_FOUND);

        let owner = retrieve_customer_payment_method(
            State(state_with(mock)),
            CustomerIdentity {
                cookie_customer_id: Some("cus_owner".to_string()),
            },
            request(),
        )
        .await
        .into_response();
        assert_eq!(owner.status(), StatusCode::OK);
        let json = body_json(owner).await;
        assert_eq!(json["paymentMethod"]["id"], "pm_1");
    }

    #[tokio::test]
    async fn config_lists_lookup_keys() {
        let response = get_config(State(state_with(MockBillingBackend::new())))
            .await
            .into_response();
        let json = body_json(response).await;
        assert_eq!(json["publishableKey"], "pk_test_123");
        assert_eq!(json["prices"], serde_json::json!(["basic"]));
    }
}
