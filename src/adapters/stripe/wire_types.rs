//! Stripe API objects as they arrive over the wire.
//!
//! Deserialized leniently (unknown fields ignored, most fields optional) and
//! converted into domain types at the adapter boundary.

use serde::Deserialize;

use crate::domain::billing::{
    Invoice, InvoiceLineItem, InvoicePaymentIntent, Period, Price, Subscription,
    SubscriptionItem, SubscriptionStatus, UsageRecord,
};
use crate::domain::webhook::ExpandableId;
use crate::ports::{BackendError, Card, Customer, PaymentIntent, PaymentMethod};

/// A reference Stripe returns either as an id or, when expanded, as the object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    Id(String),
    Object(Box<T>),
}

impl<T> Expandable<T> {
    pub fn as_object(&self) -> Option<&T> {
        match self {
            Expandable::Id(_) => None,
            Expandable::Object(object) => Some(object),
        }
    }
}

/// Paginated list envelope. `has_more` means `data` is only the first page.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    #[serde(default)]
    pub has_more: bool,
}

impl<T> Default for StripeList<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            has_more: false,
        }
    }
}

/// Error body of a non-2xx response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    pub error: StripeErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    pub message: Option<String>,
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Customers
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    pub invoice_settings: Option<StripeInvoiceSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoiceSettings {
    pub default_payment_method: Option<ExpandableId>,
}

impl From<StripeCustomer> for Customer {
    fn from(customer: StripeCustomer) -> Self {
        Customer {
            id: customer.id,
            email: customer.email,
            name: customer.name,
            default_payment_method: customer
                .invoice_settings
                .and_then(|settings| settings.default_payment_method)
                .map(|pm| pm.id().to_string()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Prices and subscriptions
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct StripePrice {
    pub id: String,
    #[serde(default)]
    pub currency: String,
    pub unit_amount: Option<i64>,
    pub lookup_key: Option<String>,
    pub recurring: Option<StripeRecurring>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeRecurring {
    pub interval: String,
}

impl From<StripePrice> for Price {
    fn from(price: StripePrice) -> Self {
        Price {
            id: price.id,
            currency: price.currency.to_ascii_lowercase(),
            unit_amount: price.unit_amount,
            lookup_key: price.lookup_key,
            interval: price.recurring.map(|r| r.interval),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub id: String,
    pub price: StripePrice,
    pub quantity: Option<u64>,
    /// Newer API versions report periods per item.
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub customer: ExpandableId,
    pub status: String,
    #[serde(default)]
    pub items: StripeList<StripeSubscriptionItem>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub default_payment_method: Option<ExpandableId>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<i64>,
    pub latest_invoice: Option<Expandable<StripeInvoice>>,
}

impl From<StripeSubscription> for Subscription {
    fn from(subscription: StripeSubscription) -> Self {
        let latest_invoice_id = subscription.latest_invoice.as_ref().and_then(|invoice| match invoice {
            Expandable::Id(id) => Some(id.clone()),
            Expandable::Object(invoice) => invoice.id.clone(),
        });
        let first_item = subscription.items.data.first();
        let current_period_start = subscription
            .current_period_start
            .or_else(|| first_item.and_then(|item| item.current_period_start))
            .unwrap_or_default();
        let current_period_end = subscription
            .current_period_end
            .or_else(|| first_item.and_then(|item| item.current_period_end))
            .unwrap_or_default();

        Subscription {
            id: subscription.id,
            customer_id: subscription.customer.id().to_string(),
            status: SubscriptionStatus::parse(&subscription.status),
            items: subscription
                .items
                .data
                .into_iter()
                .map(|item| SubscriptionItem {
                    id: item.id,
                    price: item.price.into(),
                    quantity: item.quantity.unwrap_or(1),
                })
                .collect(),
            current_period_start,
            current_period_end,
            default_payment_method: subscription
                .default_payment_method
                .map(|pm| pm.id().to_string()),
            cancel_at_period_end: subscription.cancel_at_period_end,
            canceled_at: subscription.canceled_at,
            latest_invoice_id,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Invoices and payment intents
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct StripePeriod {
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeLineItem {
    pub id: Option<String>,
    pub amount: i64,
    pub currency: Option<String>,
    pub period: StripePeriod,
    #[serde(default)]
    pub proration: bool,
    pub description: Option<String>,
    pub price: Option<StripePrice>,
    pub quantity: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoice {
    /// Absent on upcoming-invoice previews.
    pub id: Option<String>,
    pub customer: Option<ExpandableId>,
    pub subscription: Option<ExpandableId>,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub lines: StripeList<StripeLineItem>,
    #[serde(default)]
    pub amount_due: i64,
    #[serde(default)]
    pub total: i64,
    pub status: Option<String>,
    pub payment_intent: Option<Expandable<StripePaymentIntent>>,
}

impl StripeInvoice {
    /// Client secret of the expanded payment intent, if any.
    pub fn client_secret(&self) -> Option<String> {
        self.payment_intent
            .as_ref()
            .and_then(Expandable::as_object)
            .and_then(|intent| intent.client_secret.clone())
    }
}

/// Fails while `lines` is still a partial page: the totals this service
/// derives from line items would be short.
impl TryFrom<StripeInvoice> for Invoice {
    type Error = BackendError;

    fn try_from(invoice: StripeInvoice) -> Result<Self, Self::Error> {
        if invoice.lines.has_more {
            return Err(BackendError::invalid_response(format!(
                "invoice {} lists only {} of its line items",
                invoice.id.as_deref().unwrap_or("preview"),
                invoice.lines.data.len()
            )));
        }

        let currency = invoice.currency.to_ascii_lowercase();
        let lines = invoice
            .lines
            .data
            .into_iter()
            .map(|line| InvoiceLineItem {
                id: line.id,
                amount: line.amount,
                currency: line
                    .currency
                    .map(|c| c.to_ascii_lowercase())
                    .unwrap_or_else(|| currency.clone()),
                period: Period {
                    start: line.period.start,
                    end: line.period.end,
                },
                proration: line.proration,
                description: line.description,
                price_id: line.price.map(|p| p.id),
                quantity: line.quantity,
            })
            .collect();

        Ok(Invoice {
            id: invoice.id,
            customer_id: invoice.customer.map(|c| c.id().to_string()),
            subscription_id: invoice.subscription.map(|s| s.id().to_string()),
            currency,
            lines,
            amount_due: invoice.amount_due,
            total: invoice.total,
            status: invoice.status,
            payment_intent: invoice.payment_intent.map(|pi| match pi {
                Expandable::Id(id) => InvoicePaymentIntent::reference(id),
                Expandable::Object(intent) => InvoicePaymentIntent {
                    id: intent.id,
                    status: Some(intent.status).filter(|status| !status.is_empty()),
                    client_secret: intent.client_secret,
                },
            }),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    #[serde(default)]
    pub status: String,
    pub payment_method: Option<ExpandableId>,
    pub client_secret: Option<String>,
}

impl From<StripePaymentIntent> for PaymentIntent {
    fn from(intent: StripePaymentIntent) -> Self {
        PaymentIntent {
            id: intent.id,
            status: intent.status,
            payment_method: intent.payment_method.map(|pm| pm.id().to_string()),
            client_secret: intent.client_secret,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment methods and usage
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentMethod {
    pub id: String,
    #[serde(rename = "type", default)]
    pub method_type: String,
    pub customer: Option<ExpandableId>,
    pub card: Option<StripeCard>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCard {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub last4: String,
    pub exp_month: u32,
    pub exp_year: u32,
}

impl From<StripePaymentMethod> for PaymentMethod {
    fn from(method: StripePaymentMethod) -> Self {
        PaymentMethod {
            id: method.id,
            method_type: method.method_type,
            customer_id: method.customer.map(|c| c.id().to_string()),
            card: method.card.map(|card| Card {
                brand: card.brand,
                last4: card.last4,
                exp_month: card.exp_month,
                exp_year: card.exp_year,
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeUsageRecord {
    pub id: String,
    pub quantity: u64,
    pub subscription_item: String,
    pub timestamp: i64,
}

impl From<StripeUsageRecord> for UsageRecord {
    fn from(record: StripeUsageRecord) -> Self {
        UsageRecord {
            id: record.id,
            subscription_item_id: record.subscription_item,
            quantity: record.quantity,
            timestamp: record.timestamp,
        }
    }
}
