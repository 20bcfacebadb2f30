//! Processor event envelope and the typed payloads this service reacts to.

use serde::{Deserialize, Serialize};

use super::errors::WebhookError;

/// Event type for a paid invoice (older API versions).
pub const INVOICE_PAYMENT_SUCCEEDED: &str = "invoice.payment_succeeded";
/// Event type for a paid invoice.
pub const INVOICE_PAID: &str = "invoice.paid";
/// Event type for a completed hosted checkout.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Billing reason on the first invoice of a new subscription.
pub const BILLING_REASON_SUBSCRIPTION_CREATE: &str = "subscription_create";

/// Authenticated event as delivered. Only `type` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub created: i64,

    #[serde(default)]
    pub livemode: bool,

    #[serde(default)]
    pub data: EventData,

    #[serde(default)]
    pub request: Option<EventRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    /// The resource the event is about. Shape depends on `type`.
    #[serde(default)]
    pub object: serde_json::Value,
}

/// API request that caused the event. Older API versions send a bare id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventRequest {
    Id(String),
    Detail {
        id: Option<String>,
        #[serde(default)]
        idempotency_key: Option<String>,
    },
}

impl EventRequest {
    pub fn id(&self) -> Option<&str> {
        match self {
            EventRequest::Id(id) => Some(id),
            EventRequest::Detail { id, .. } => id.as_deref(),
        }
    }
}

/// Reference that is either an id or the expanded object carrying one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpandableId {
    Id(String),
    Object { id: String },
}

impl ExpandableId {
    pub fn id(&self) -> &str {
        match self {
            ExpandableId::Id(id) => id,
            ExpandableId::Object { id } => id,
        }
    }

    fn into_id(self) -> String {
        match self {
            ExpandableId::Id(id) => id,
            ExpandableId::Object { id } => id,
        }
    }
}

/// Decoded event, one variant per type this service handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    /// `invoice.payment_succeeded` or `invoice.paid`.
    InvoicePaid(InvoicePayment),

    /// `checkout.session.completed`.
    CheckoutCompleted(CheckoutCompletion),

    /// Anything else. Acknowledged without side effects.
    Other { event_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicePayment {
    pub invoice_id: Option<String>,
    pub billing_reason: Option<String>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub payment_intent_id: Option<String>,
}

impl InvoicePayment {
    /// First invoice of a freshly created subscription.
    pub fn is_subscription_create(&self) -> bool {
        self.billing_reason.as_deref() == Some(BILLING_REASON_SUBSCRIPTION_CREATE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCompletion {
    pub session_id: Option<String>,
    pub customer_id: Option<String>,
    /// Names of purchased items, from display items or line item descriptions.
    pub item_names: Vec<String>,
}

impl CheckoutCompletion {
    pub fn contains_item(&self, name: &str) -> bool {
        self.item_names.iter().any(|item| item == name)
    }
}

#[derive(Debug, Deserialize)]
struct InvoiceObject {
    id: Option<String>,
    billing_reason: Option<String>,
    customer: Option<ExpandableId>,
    subscription: Option<ExpandableId>,
    payment_intent: Option<ExpandableId>,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    id: Option<String>,
    customer: Option<ExpandableId>,
    #[serde(default)]
    display_items: Vec<DisplayItem>,
    line_items: Option<LineItemList>,
}

#[derive(Debug, Deserialize)]
struct DisplayItem {
    custom: Option<CustomItem>,
}

#[derive(Debug, Deserialize)]
struct CustomItem {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LineItemList {
    #[serde(default)]
    data: Vec<LineItem>,
}

#[derive(Debug, Deserialize)]
struct LineItem {
    description: Option<String>,
}

impl Event {
    /// Decodes `data.object` according to the event type.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::MalformedPayload` if a handled type carries an
    /// object of the wrong shape. Unhandled types never fail.
    pub fn payload(&self) -> Result<EventPayload, WebhookError> {
        match self.event_type.as_str() {
            INVOICE_PAYMENT_SUCCEEDED | INVOICE_PAID => {
                let invoice: InvoiceObject = self.decode_object()?;
                Ok(EventPayload::InvoicePaid(InvoicePayment {
                    invoice_id: invoice.id,
                    billing_reason: invoice.billing_reason,
                    customer_id: invoice.customer.map(ExpandableId::into_id),
                    subscription_id: invoice.subscription.map(ExpandableId::into_id),
                    payment_intent_id: invoice.payment_intent.map(ExpandableId::into_id),
                }))
            }
            CHECKOUT_SESSION_COMPLETED => {
                let session: CheckoutSessionObject = self.decode_object()?;
                let display_names = session
                    .display_items
                    .into_iter()
                    .filter_map(|item| item.custom.and_then(|custom| custom.name));
                let line_names = session
                    .line_items
                    .map(|list| list.data)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|line| line.description);

                Ok(EventPayload::CheckoutCompleted(CheckoutCompletion {
                    session_id: session.id,
                    customer_id: session.customer.map(ExpandableId::into_id),
                    item_names: display_names.chain(line_names).collect(),
                }))
            }
            other => Ok(EventPayload::Other {
                event_type: other.to_string(),
            }),
        }
    }

    fn decode_object<T: serde::de::DeserializeOwned>(&self) -> Result<T, WebhookError> {
        T::deserialize(&self.data.object).map_err(|e| {
            WebhookError::MalformedPayload(format!("{} object: {}", self.event_type, e))
        })
    }
}
