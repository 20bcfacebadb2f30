//! Billing backend port.
//!
//! The backend (Stripe in production) is the system of record for customers,
//! subscriptions, invoices and payment intents. This service never persists
//! any of them; it reads current state and submits changes through this port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::{
    BillingError, Invoice, ItemChange, Subscription, UsageAction, UsageRecord,
};

/// Port for the billing backend.
///
/// Implementations bound every call with a timeout and never retry.
#[async_trait]
pub trait BillingBackend: Send + Sync {
    /// Create a customer.
    async fn create_customer(&self, request: CreateCustomerRequest)
        -> Result<Customer, BackendError>;

    /// Get a customer. `None` if it does not exist.
    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, BackendError>;

    /// Create a subscription whose first invoice awaits payment.
    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<CreatedSubscription, BackendError>;

    /// Get a subscription. `None` if it does not exist.
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, BackendError>;

    /// All subscriptions of a customer, any status.
    async fn list_subscriptions(&self, customer_id: &str)
        -> Result<Vec<Subscription>, BackendError>;

    /// Cancel a subscription immediately.
    async fn cancel_subscription(&self, subscription_id: &str)
        -> Result<Subscription, BackendError>;

    /// Apply a set of item changes in one call. The backend prorates.
    async fn update_subscription(
        &self,
        request: UpdateSubscriptionRequest,
    ) -> Result<Subscription, BackendError>;

    /// Quote the upcoming invoice for a hypothetical change. Commits nothing.
    async fn preview_invoice(&self, request: InvoicePreviewRequest)
        -> Result<Invoice, BackendError>;

    /// Get an issued invoice. `None` if it does not exist.
    async fn get_invoice(&self, invoice_id: &str) -> Result<Option<Invoice>, BackendError>;

    /// Get a payment intent. `None` if it does not exist.
    async fn get_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<PaymentIntent>, BackendError>;

    /// Get a payment method. `None` if it does not exist.
    async fn get_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<Option<PaymentMethod>, BackendError>;

    /// Attach a payment method to a customer.
    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<(), BackendError>;

    /// Make a payment method the customer's default for invoices.
    async fn set_customer_default_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<Customer, BackendError>;

    /// Make a payment method the subscription's default.
    async fn set_subscription_default_payment_method(
        &self,
        subscription_id: &str,
        payment_method_id: &str,
    ) -> Result<Subscription, BackendError>;

    /// Record metered usage against a subscription item.
    async fn report_usage(&self, request: UsageRecordRequest)
        -> Result<UsageRecord, BackendError>;
}

/// Request to create a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    pub email: String,
    pub name: Option<String>,
}

/// Customer in the billing backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub default_payment_method: Option<String>,
}

/// Request to create a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub customer_id: String,
    pub price_id: String,
    pub quantity: u64,
    pub idempotency_key: Option<String>,
}

/// A newly created subscription and the secret the client confirms payment with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSubscription {
    pub subscription: Subscription,
    pub client_secret: Option<String>,
}

/// Request to change a subscription's items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateSubscriptionRequest {
    pub subscription_id: String,
    pub items: Vec<ItemChange>,

    /// Sent as `Idempotency-Key` so a retried commit is applied once.
    pub idempotency_key: Option<String>,
}

/// Request for a non-committing upcoming-invoice quote.
///
/// With `subscription_id` the quote is for changing that subscription;
/// without it the quote is for a new subscription with `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoicePreviewRequest {
    pub customer_id: String,
    pub subscription_id: Option<String>,
    pub items: Vec<ItemChange>,
}

/// Payment intent, reduced to what reconciliation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    pub payment_method: Option<String>,
    pub client_secret: Option<String>,
}

/// Payment method as the customer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,

    /// `card`, `sepa_debit`, ...
    pub method_type: String,

    /// Customer it is attached to, if any.
    pub customer_id: Option<String>,

    pub card: Option<Card>,
}

/// Display details of a card. Never the full number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub brand: String,
    pub last4: String,
    pub exp_month: u32,
    pub exp_year: u32,
}

/// Metered usage to record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageRecordRequest {
    pub subscription_item_id: String,
    pub quantity: u64,

    /// Unix timestamp to attribute the usage to; the backend's clock if `None`.
    pub timestamp: Option<i64>,

    pub action: UsageAction,

    /// Sent as `Idempotency-Key` so a retried report is counted once.
    pub idempotency_key: Option<String>,
}

/// Billing backend error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendError {
    /// Error category.
    pub code: BackendErrorCode,

    /// Message as the backend phrased it.
    pub message: String,

    /// Backend's own error code, if provided.
    pub provider_code: Option<String>,

    /// Backend correlation id. Logged, never shown to callers.
    pub request_id: Option<String>,
}

impl BackendError {
    pub fn new(code: BackendErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            request_id: None,
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// The backend refused the request (4xx).
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(BackendErrorCode::Rejected, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(BackendErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn timeout(timeout_secs: u64) -> Self {
        Self::new(
            BackendErrorCode::Timeout,
            format!("no response within {}s", timeout_secs),
        )
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BackendErrorCode::Network, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(BackendErrorCode::InvalidResponse, message)
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for BackendError {}

impl From<BackendError> for BillingError {
    fn from(err: BackendError) -> Self {
        match err.code {
            BackendErrorCode::Rejected => BillingError::BackendRejected(err.message),
            BackendErrorCode::NotFound => BillingError::BackendRejected(err.message),
            BackendErrorCode::Timeout => BillingError::UpstreamTimeout(err.message),
            BackendErrorCode::Network | BackendErrorCode::InvalidResponse => {
                BillingError::UpstreamUnavailable(err.message)
            }
        }
    }
}

/// Backend error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorCode {
    /// Request refused (bad parameters, declined, invalid state).
    Rejected,

    /// Referenced resource does not exist.
    NotFound,

    /// No response within the configured timeout.
    Timeout,

    /// Connection failure.
    Network,

    /// Response could not be decoded.
    InvalidResponse,
}

impl std::fmt::Display for BackendErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BackendErrorCode::Rejected => "rejected",
            BackendErrorCode::NotFound => "not_found",
            BackendErrorCode::Timeout => "timeout",
            BackendErrorCode::Network => "network_error",
            BackendErrorCode::InvalidResponse => "invalid_response",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_keeps_backend_message_verbatim() {
        let err = BackendError::rejected("Your card was declined.")
            .with_provider_code("card_declined")
            .with_request_id(Some("req_abc".to_string()));

        let billing: BillingError = err.into();

        assert_eq!(
            billing,
            BillingError::BackendRejected("Your card was declined.".to_string())
        );
        assert!(!billing.to_string().contains("req_abc"));
    }

    #[test]
    fn timeout_maps_to_upstream_timeout() {
        let billing: BillingError = BackendError::timeout(10).into();
        assert_eq!(
            billing,
            BillingError::UpstreamTimeout("no response within 10s".to_string())
        );
    }

    #[test]
    fn network_maps_to_upstream_unavailable() {
        let billing: BillingError = BackendError::network("connection refused").into();
        assert!(matches!(billing, BillingError::UpstreamUnavailable(_)));
    }

    #[test]
    fn display_includes_code() {
        let err = BackendError::not_found("Subscription");
        assert_eq!(err.to_string(), "not_found: Subscription not found");
    }
}
