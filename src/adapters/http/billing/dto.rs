//! Request and response bodies for the billing endpoints.
//!
//! Field names are camelCase to match the storefront frontend.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::SubscriptionInformation;
use crate::domain::billing::{
    Invoice, InvoiceLineItem, InvoicePaymentIntent, ProrationSplit, Subscription,
    SubscriptionItem, UsageRecord,
};
use crate::ports::{Card, Customer, PaymentMethod};

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    pub price_lookup_key: String,
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionRequest {
    pub subscription_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    pub subscription_id: String,
    #[serde(default)]
    pub new_price_lookup_key: Option<String>,
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePreviewRequest {
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub new_price_lookup_key: Option<String>,
    #[serde(default)]
    pub quantity: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryInvoiceRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    pub payment_method_id: String,
    pub invoice_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInformationRequest {
    pub subscription_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPaymentMethodRequest {
    pub payment_method_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportUsageRequest {
    pub subscription_item_id: String,
    pub quantity: u64,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSubscriptionsParams {
    #[serde(default)]
    pub customer_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub publishable_key: String,
    pub prices: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub default_payment_method: Option<String>,
}

impl From<Customer> for CustomerView {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            email: customer.email,
            name: customer.name,
            default_payment_method: customer.default_payment_method,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerResponse {
    pub customer: CustomerView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionResponse {
    pub subscription_id: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionItemView {
    pub id: String,
    pub price_id: String,
    pub price_lookup_key: Option<String>,
    pub currency: String,
    pub unit_amount: Option<i64>,
    pub interval: Option<String>,
    pub quantity: u64,
}

impl From<SubscriptionItem> for SubscriptionItemView {
    fn from(item: SubscriptionItem) -> Self {
        Self {
            id: item.id,
            price_id: item.price.id,
            price_lookup_key: item.price.lookup_key,
            currency: item.price.currency,
            unit_amount: item.price.unit_amount,
            interval: item.price.interval,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub items: Vec<SubscriptionItemView>,
    pub current_period_start: i64,
    pub current_period_end: i64,
    pub default_payment_method: Option<String>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<i64>,
    pub latest_invoice_id: Option<String>,
}

impl From<Subscription> for SubscriptionView {
    fn from(subscription: Subscription) -> Self {
        Self {
            id: subscription.id,
            customer_id: subscription.customer_id,
            status: subscription.status.as_str().to_string(),
            items: subscription.items.into_iter().map(Into::into).collect(),
            current_period_start: subscription.current_period_start,
            current_period_end: subscription.current_period_end,
            default_payment_method: subscription.default_payment_method,
            cancel_at_period_end: subscription.cancel_at_period_end,
            canceled_at: subscription.canceled_at,
            latest_invoice_id: subscription.latest_invoice_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub subscription: SubscriptionView,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionsResponse {
    pub subscriptions: Vec<SubscriptionView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineView {
    pub id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub period_start: i64,
    pub period_end: i64,
    pub proration: bool,
    pub description: Option<String>,
    pub price_id: Option<String>,
    pub quantity: Option<u64>,
}

impl From<InvoiceLineItem> for InvoiceLineView {
    fn from(line: InvoiceLineItem) -> Self {
        Self {
            id: line.id,
            amount: line.amount,
            currency: line.currency,
            period_start: line.period.start,
            period_end: line.period.end,
            proration: line.proration,
            description: line.description,
            price_id: line.price_id,
            quantity: line.quantity,
        }
    }
}

/// Enough of the collecting payment intent for the client to finish a
/// payment that needs customer action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePaymentIntentView {
    pub id: String,
    pub status: Option<String>,
    pub client_secret: Option<String>,
}

impl From<InvoicePaymentIntent> for InvoicePaymentIntentView {
    fn from(intent: InvoicePaymentIntent) -> Self {
        Self {
            id: intent.id,
            status: intent.status,
            client_secret: intent.client_secret,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    pub id: Option<String>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub currency: String,
    pub amount_due: i64,
    pub total: i64,
    pub status: Option<String>,
    pub payment_intent: Option<InvoicePaymentIntentView>,
    pub lines: Vec<InvoiceLineView>,
}

impl From<Invoice> for InvoiceView {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            customer_id: invoice.customer_id,
            subscription_id: invoice.subscription_id,
            currency: invoice.currency,
            amount_due: invoice.amount_due,
            total: invoice.total,
            status: invoice.status,
            payment_intent: invoice.payment_intent.map(Into::into),
            lines: invoice.lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceResponse {
    pub invoice: InvoiceView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePreviewResponse {
    pub immediate_total: i64,
    pub next_invoice_sum: i64,
    pub currency: String,
    pub invoice: InvoiceView,
}

impl InvoicePreviewResponse {
    pub fn new(split: ProrationSplit, invoice: Invoice) -> Self {
        Self {
            immediate_total: split.immediate_total,
            next_invoice_sum: split.next_period_total,
            currency: split.currency,
            invoice: invoice.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub brand: String,
    pub last4: String,
    pub exp_month: u32,
    pub exp_year: u32,
}

impl From<Card> for CardView {
    fn from(card: Card) -> Self {
        Self {
            brand: card.brand,
            last4: card.last4,
            exp_month: card.exp_month,
            exp_year: card.exp_year,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodView {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub customer_id: Option<String>,
    pub card: Option<CardView>,
}

impl From<PaymentMethod> for PaymentMethodView {
    fn from(method: PaymentMethod) -> Self {
        Self {
            id: method.id,
            method_type: method.method_type,
            customer_id: method.customer_id,
            card: method.card.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodResponse {
    pub payment_method: PaymentMethodView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInformationResponse {
    pub subscription: SubscriptionView,
    pub current_price: Option<String>,
    pub current_price_lookup_key: Option<String>,
    pub current_quantity: Option<u64>,
    pub latest_invoice: Option<InvoiceView>,
    pub upcoming_invoice: Option<InvoiceView>,
    pub card: Option<CardView>,
}

impl From<SubscriptionInformation> for SubscriptionInformationResponse {
    fn from(info: SubscriptionInformation) -> Self {
        let (current_price, current_price_lookup_key) = match info.current_price {
            Some(price) => (Some(price.id), price.lookup_key),
            None => (None, None),
        };
        Self {
            subscription: info.subscription.into(),
            current_price,
            current_price_lookup_key,
            current_quantity: info.current_quantity,
            latest_invoice: info.latest_invoice.map(Into::into),
            upcoming_invoice: info.upcoming_invoice.map(Into::into),
            card: info.card.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecordView {
    pub id: String,
    pub subscription_item_id: String,
    pub quantity: u64,
    pub timestamp: i64,
}

impl From<UsageRecord> for UsageRecordView {
    fn from(record: UsageRecord) -> Self {
        Self {
            id: record.id,
            subscription_item_id: record.subscription_item_id,
            quantity: record.quantity,
            timestamp: record.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecordResponse {
    pub usage_record: UsageRecordView,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Error envelope: `{"error": {"message": "..."}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
            },
        }
    }
}
