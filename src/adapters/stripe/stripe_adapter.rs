//! Stripe billing backend adapter.
//!
//! Implements `BillingBackend` against the Stripe REST API: form-encoded
//! requests, basic auth with the secret key, JSON responses. Every request
//! pins `Stripe-Version` so response shapes do not follow the account default.
//!
//! Every request is bounded by the client timeout. Nothing is retried here;
//! committing calls carry the caller's `Idempotency-Key` when one is given.
//! Stripe's `Request-Id` is logged on failure and never leaves this module.
//!
//! Identifiers are appended to the URL as single percent-encoded path
//! segments, so a caller-supplied id can never address another resource.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(secret_key).with_timeout(Duration::from_secs(10));
//! let adapter = StripeBillingAdapter::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::domain::billing::{Invoice, ItemChange, Subscription, UsageRecord};
use crate::ports::{
    BackendError, BackendErrorCode, BillingBackend, CreateCustomerRequest,
    CreateSubscriptionRequest, CreatedSubscription, Customer, InvoicePreviewRequest,
    PaymentIntent, PaymentMethod, UpdateSubscriptionRequest, UsageRecordRequest,
};

use super::wire_types::{
    Expandable, StripeCustomer, StripeErrorBody, StripeInvoice, StripeLineItem, StripeList,
    StripePaymentIntent, StripePaymentMethod, StripeSubscription, StripeUsageRecord,
};

/// Default Stripe API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// API version every request is pinned to. Upcoming-invoice previews and the
/// top-level `invoice.payment_intent` / `invoice.subscription` fields this
/// adapter reads exist in this version.
pub const STRIPE_API_VERSION: &str = "2022-08-01";

/// Page size when fetching the remaining line items of an invoice.
const LINES_PAGE_SIZE: u32 = 100;

type Params = Vec<(String, String)>;

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for the API (default: https://api.stripe.com).
    api_base_url: String,

    /// Sent as `Stripe-Version`.
    api_version: String,

    /// Upper bound for each request.
    timeout: Duration,
}

impl StripeConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: STRIPE_API_VERSION.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing against a local stub).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Stripe billing backend adapter.
pub struct StripeBillingAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeBillingAdapter {
    /// Create a new adapter. The HTTP client is shared across requests.
    pub fn new(config: StripeConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// `{base}/v1/{segments...}` with each segment percent-encoded.
    ///
    /// Empty, `.` and `..` segments are refused rather than silently dropped.
    fn url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        if let Some(segment) = segments
            .iter()
            .find(|segment| segment.is_empty() || **segment == "." || **segment == "..")
        {
            return Err(BackendError::rejected(format!(
                "Invalid identifier: '{}'",
                segment
            )));
        }

        let mut url = Url::parse(&self.config.api_base_url)
            .map_err(|e| BackendError::network(format!("Invalid Stripe API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::network("Stripe API base URL cannot carry a path"))?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, BackendError> {
        Ok(self
            .http_client
            .request(method, self.url(segments)?)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .header("Stripe-Version", self.config.api_version.as_str()))
    }

    fn get(&self, segments: &[&str]) -> Result<reqwest::RequestBuilder, BackendError> {
        self.request(Method::GET, segments)
    }

    fn post(
        &self,
        segments: &[&str],
        params: &Params,
    ) -> Result<reqwest::RequestBuilder, BackendError> {
        Ok(self.request(Method::POST, segments)?.form(params))
    }

    fn delete(&self, segments: &[&str]) -> Result<reqwest::RequestBuilder, BackendError> {
        self.request(Method::DELETE, segments)
    }

    /// Sends a request and decodes a 2xx body. 404 becomes `NotFound`.
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = request.send().await.map_err(|e| {
            let err = if e.is_timeout() {
                BackendError::timeout(self.config.timeout.as_secs())
            } else {
                BackendError::network(format!("Stripe request failed: {}", e))
            };
            tracing::error!(operation, error = %err, "Stripe request did not complete");
            err
        })?;

        let status = response.status();
        let request_id = response
            .headers()
            .get("request-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if status.is_success() {
            // The client timeout also covers reading the body
            return response.json::<T>().await.map_err(|e| {
                let err = if e.is_timeout() {
                    BackendError::timeout(self.config.timeout.as_secs())
                } else {
                    BackendError::invalid_response(format!("Failed to parse Stripe response: {}", e))
                };
                tracing::error!(
                    operation,
                    request_id = request_id.as_deref().unwrap_or_default(),
                    error = %err,
                    "Failed to read Stripe response"
                );
                err.with_request_id(request_id.clone())
            });
        }

        let body = response.text().await.unwrap_or_default();
        let err = error_from_response(status, &body).with_request_id(request_id);

        tracing::warn!(
            operation,
            status = status.as_u16(),
            request_id = err.request_id.as_deref().unwrap_or_default(),
            provider_code = err.provider_code.as_deref().unwrap_or_default(),
            error = %err.message,
            "Stripe API error"
        );
        Err(err)
    }

    /// Like `send`, but a 404 is `Ok(None)`.
    async fn send_optional<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, BackendError> {
        match self.send(operation, request).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.code == BackendErrorCode::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Pages through `lines_path` until the invoice carries every line item.
    ///
    /// `params` must repeat whatever selected the invoice (the preview
    /// parameters for an upcoming invoice).
    async fn fetch_remaining_lines(
        &self,
        invoice: &mut StripeInvoice,
        lines_path: &[&str],
        params: &Params,
    ) -> Result<(), BackendError> {
        while invoice.lines.has_more {
            let starting_after = invoice
                .lines
                .data
                .last()
                .and_then(|line| line.id.clone())
                .ok_or_else(|| {
                    BackendError::invalid_response("truncated invoice lines carry no cursor")
                })?;

            let mut page_params = params.clone();
            page_params.push(("limit".to_string(), LINES_PAGE_SIZE.to_string()));
            page_params.push(("starting_after".to_string(), starting_after));

            let page: StripeList<StripeLineItem> = self
                .send("list_invoice_lines", self.get(lines_path)?.query(&page_params))
                .await?;
            if page.data.is_empty() && page.has_more {
                return Err(BackendError::invalid_response(
                    "invoice line page is empty but reports more",
                ));
            }

            invoice.lines.data.extend(page.data);
            invoice.lines.has_more = page.has_more;
        }
        Ok(())
    }
}

/// Maps a non-2xx response to a `BackendError` carrying Stripe's own message.
fn error_from_response(status: reqwest::StatusCode, body: &str) -> BackendError {
    let detail = serde_json::from_str::<StripeErrorBody>(body).ok().map(|b| b.error);
    let message = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .unwrap_or_else(|| format!("Stripe API error: HTTP {}", status.as_u16()));

    let code = if status == reqwest::StatusCode::NOT_FOUND {
        BackendErrorCode::NotFound
    } else if status.is_client_error() {
        BackendErrorCode::Rejected
    } else {
        BackendErrorCode::Network
    };

    let mut err = BackendError::new(code, message);
    if let Some(provider_code) = detail.and_then(|d| d.code.or(d.error_type)) {
        err = err.with_provider_code(provider_code);
    }
    err
}

/// Encodes item changes as `{prefix}[i][...]` form fields.
fn item_params(prefix: &str, items: &[ItemChange]) -> Params {
    let mut params = Vec::new();
    for (index, change) in items.iter().enumerate() {
        let key = |field: &str| format!("{}[{}][{}]", prefix, index, field);
        match change {
            ItemChange::Update { id, quantity } => {
                params.push((key("id"), id.clone()));
                params.push((key("quantity"), quantity.to_string()));
            }
            ItemChange::Delete { id } => {
                params.push((key("id"), id.clone()));
                params.push((key("deleted"), "true".to_string()));
            }
            ItemChange::Add { price_id, quantity } => {
                params.push((key("price"), price_id.clone()));
                params.push((key("quantity"), quantity.to_string()));
            }
        }
    }
    params
}

fn with_idempotency_key(
    request: reqwest::RequestBuilder,
    idempotency_key: Option<&str>,
) -> reqwest::RequestBuilder {
    match idempotency_key {
        Some(key) => request.header("Idempotency-Key", key),
        None => request,
    }
}

#[async_trait]
impl BillingBackend for StripeBillingAdapter {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, BackendError> {
        let mut params: Params = vec![("email".to_string(), request.email)];
        if let Some(name) = request.name {
            params.push(("name".to_string(), name));
        }

        let customer: StripeCustomer = self
            .send("create_customer", self.post(&["customers"], &params)?)
            .await?;
        Ok(customer.into())
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, BackendError> {
        let customer: Option<StripeCustomer> = self
            .send_optional("get_customer", self.get(&["customers", customer_id])?)
            .await?;
        Ok(customer.filter(|c| !c.deleted).map(Customer::from))
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<CreatedSubscription, BackendError> {
        let mut params: Params = vec![
            ("customer".to_string(), request.customer_id),
            ("payment_behavior".to_string(), "default_incomplete".to_string()),
            ("expand[]".to_string(), "latest_invoice.payment_intent".to_string()),
        ];
        params.extend(item_params(
            "items",
            &[ItemChange::Add {
                price_id: request.price_id,
                quantity: request.quantity,
            }],
        ));

        let http_request = with_idempotency_key(
            self.post(&["subscriptions"], &params)?,
            request.idempotency_key.as_deref(),
        );
        let subscription: StripeSubscription =
            self.send("create_subscription", http_request).await?;

        let client_secret = subscription
            .latest_invoice
            .as_ref()
            .and_then(Expandable::as_object)
            .and_then(|invoice| invoice.client_secret());

        Ok(CreatedSubscription {
            subscription: subscription.into(),
            client_secret,
        })
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, BackendError> {
        let subscription: Option<StripeSubscription> = self
            .send_optional(
                "get_subscription",
                self.get(&["subscriptions", subscription_id])?,
            )
            .await?;
        Ok(subscription.map(Subscription::from))
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
    ) -> Result<Vec<Subscription>, BackendError> {
        let request = self.get(&["subscriptions"])?.query(&[
            ("customer", customer_id),
            ("status", "all"),
            ("limit", "100"),
        ]);
        let list: StripeList<StripeSubscription> =
            self.send("list_subscriptions", request).await?;

        if list.has_more {
            tracing::warn!(customer_id, "Subscription list truncated at 100");
        }
        Ok(list.data.into_iter().map(Subscription::from).collect())
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, BackendError> {
        let subscription: StripeSubscription = self
            .send(
                "cancel_subscription",
                self.delete(&["subscriptions", subscription_id])?,
            )
            .await?;
        Ok(subscription.into())
    }

    async fn update_subscription(
        &self,
        request: UpdateSubscriptionRequest,
    ) -> Result<Subscription, BackendError> {
        let params = item_params("items", &request.items);
        let http_request = with_idempotency_key(
            self.post(&["subscriptions", request.subscription_id.as_str()], &params)?,
            request.idempotency_key.as_deref(),
        );

        let subscription: StripeSubscription =
            self.send("update_subscription", http_request).await?;
        Ok(subscription.into())
    }

    async fn preview_invoice(
        &self,
        request: InvoicePreviewRequest,
    ) -> Result<Invoice, BackendError> {
        let mut params: Params = vec![("customer".to_string(), request.customer_id)];
        if let Some(subscription_id) = request.subscription_id {
            params.push(("subscription".to_string(), subscription_id));
        }
        params.extend(item_params("subscription_items", &request.items));

        let mut invoice: StripeInvoice = self
            .send("preview_invoice", self.get(&["invoices", "upcoming"])?.query(&params))
            .await?;
        self.fetch_remaining_lines(&mut invoice, &["invoices", "upcoming", "lines"], &params)
            .await?;
        Invoice::try_from(invoice)
    }

    async fn get_invoice(&self, invoice_id: &str) -> Result<Option<Invoice>, BackendError> {
        let request = self
            .get(&["invoices", invoice_id])?
            .query(&[("expand[]", "payment_intent")]);
        let invoice: Option<StripeInvoice> = self.send_optional("get_invoice", request).await?;

        match invoice {
            Some(mut invoice) => {
                let lines_path = ["invoices", invoice_id, "lines"];
                self.fetch_remaining_lines(&mut invoice, &lines_path, &Vec::new())
                    .await?;
                Invoice::try_from(invoice).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn get_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<PaymentIntent>, BackendError> {
        let intent: Option<StripePaymentIntent> = self
            .send_optional(
                "get_payment_intent",
                self.get(&["payment_intents", payment_intent_id])?,
            )
            .await?;
        Ok(intent.map(PaymentIntent::from))
    }

    async fn get_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<Option<PaymentMethod>, BackendError> {
        let method: Option<StripePaymentMethod> = self
            .send_optional(
                "get_payment_method",
                self.get(&["payment_methods", payment_method_id])?,
            )
            .await?;
        Ok(method.map(PaymentMethod::from))
    }

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<(), BackendError> {
        let params: Params = vec![("customer".to_string(), customer_id.to_string())];
        let _: serde_json::Value = self
            .send(
                "attach_payment_method",
                self.post(&["payment_methods", payment_method_id, "attach"], &params)?,
            )
            .await?;
        Ok(())
    }

    async fn set_customer_default_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<Customer, BackendError> {
        let params: Params = vec![(
            "invoice_settings[default_payment_method]".to_string(),
            payment_method_id.to_string(),
        )];
        let customer: StripeCustomer = self
            .send(
                "set_customer_default_payment_method",
                self.post(&["customers", customer_id], &params)?,
            )
            .await?;
        Ok(customer.into())
    }

    async fn set_subscription_default_payment_method(
        &self,
        subscription_id: &str,
        payment_method_id: &str,
    ) -> Result<Subscription, BackendError> {
        let params: Params = vec![(
            "default_payment_method".to_string(),
            payment_method_id.to_string(),
        )];
        let subscription: StripeSubscription = self
            .send(
                "set_subscription_default_payment_method",
                self.post(&["subscriptions", subscription_id], &params)?,
            )
            .await?;
        Ok(subscription.into())
    }

    async fn report_usage(&self, request: UsageRecordRequest) -> Result<UsageRecord, BackendError> {
        let timestamp = request
            .timestamp
            .map(|ts| ts.to_string())
            .unwrap_or_else(|| "now".to_string());
        let params: Params = vec![
            ("quantity".to_string(), request.quantity.to_string()),
            ("timestamp".to_string(), timestamp),
            ("action".to_string(), request.action.as_str().to_string()),
        ];

        let http_request = with_idempotency_key(
            self.post(
                &["subscription_items", request.subscription_item_id.as_str(), "usage_records"],
                &params,
            )?,
            request.idempotency_key.as_deref(),
        );
        let record: StripeUsageRecord = self.send("report_usage", http_request).await?;
        Ok(record.into())
    }
}
