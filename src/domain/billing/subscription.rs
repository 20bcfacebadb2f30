//! Subscription, item and price as reported by the billing backend.
//!
//! These are read models: the backend is the system of record and the
//! service re-fetches them before every mutation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Subscription lifecycle status.
///
/// Serialized as the backend's snake_case string. A status this service does
/// not know is kept verbatim in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// Created, first payment not yet confirmed.
    Incomplete,

    /// First payment never confirmed; terminal.
    IncompleteExpired,

    /// In a free trial.
    Trialing,

    /// Paid and current.
    Active,

    /// Renewal payment failed, retries pending.
    PastDue,

    /// Canceled; terminal.
    Canceled,

    /// Retries exhausted without payment.
    Unpaid,

    /// Collection paused.
    Paused,

    /// Status added by the backend after this service was written.
    Unknown(String),
}

impl SubscriptionStatus {
    /// Parses the backend's status string.
    pub fn parse(status: &str) -> Self {
        match status {
            "incomplete" => SubscriptionStatus::Incomplete,
            "incomplete_expired" => SubscriptionStatus::IncompleteExpired,
            "trialing" => SubscriptionStatus::Trialing,
            "active" => SubscriptionStatus::Active,
            "past_due" => SubscriptionStatus::PastDue,
            "canceled" => SubscriptionStatus::Canceled,
            "unpaid" => SubscriptionStatus::Unpaid,
            "paused" => SubscriptionStatus::Paused,
            other => SubscriptionStatus::Unknown(other.to_string()),
        }
    }

    /// The backend's string for this status.
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Unknown(status) => status,
        }
    }

    /// No further mutation is possible once a subscription reaches these states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Canceled | SubscriptionStatus::IncompleteExpired
        )
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SubscriptionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubscriptionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let status = String::deserialize(deserializer)?;
        Ok(SubscriptionStatus::parse(&status))
    }
}

/// A price as attached to a subscription item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub id: String,

    /// Lowercase ISO currency code.
    pub currency: String,

    /// Per-unit amount in minor units; `None` for metered or tiered prices.
    pub unit_amount: Option<i64>,

    /// Human-readable key the storefront refers to this price by.
    pub lookup_key: Option<String>,

    /// Billing interval (`month`, `year`, ...) for recurring prices.
    pub interval: Option<String>,
}

/// One priced line of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionItem {
    /// Backend-assigned identifier, opaque to this service.
    pub id: String,
    pub price: Price,
    pub quantity: u64,
}

/// A recurring billing plan for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer_id: String,
    pub status: SubscriptionStatus,
    pub items: Vec<SubscriptionItem>,

    /// Current billing period start (Unix timestamp).
    pub current_period_start: i64,

    /// Current billing period end (Unix timestamp).
    pub current_period_end: i64,

    pub default_payment_method: Option<String>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<i64>,

    /// Most recent invoice the backend issued for this subscription.
    pub latest_invoice_id: Option<String>,
}

impl Subscription {
    /// The item this service manipulates. Subscriptions here are single-item.
    pub fn primary_item(&self) -> Option<&SubscriptionItem> {
        self.items.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, price_id: &str, quantity: u64) -> SubscriptionItem {
        SubscriptionItem {
            id: id.to_string(),
            price: Price {
                id: price_id.to_string(),
                currency: "usd".to_string(),
                unit_amount: Some(500),
                lookup_key: None,
                interval: Some("month".to_string()),
            },
            quantity,
        }
    }

    fn subscription(items: Vec<SubscriptionItem>) -> Subscription {
        Subscription {
            id: "sub_1".to_string(),
            customer_id: "cus_1".to_string(),
            status: SubscriptionStatus::Active,
            items,
            current_period_start: 0,
            current_period_end: 1000,
            default_payment_method: None,
            cancel_at_period_end: false,
            canceled_at: None,
            latest_invoice_id: None,
        }
    }

    #[test]
    fn status_parse_known_values() {
        assert_eq!(SubscriptionStatus::parse("active"), SubscriptionStatus::Active);
        assert_eq!(SubscriptionStatus::parse("past_due"), SubscriptionStatus::PastDue);
        assert_eq!(
            SubscriptionStatus::parse("incomplete_expired"),
            SubscriptionStatus::IncompleteExpired
        );
    }

    #[test]
    fn status_parse_unknown_value() {
        assert_eq!(
            SubscriptionStatus::parse("some_new_status"),
            SubscriptionStatus::Unknown("some_new_status".to_string())
        );
    }

    #[test]
    fn unknown_status_survives_serde() {
        let status: SubscriptionStatus = serde_json::from_str("\"hibernating\"").unwrap();
        assert_eq!(status, SubscriptionStatus::Unknown("hibernating".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"hibernating\"");
        assert!(!status.is_terminal());
    }

    #[test]
    fn known_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SubscriptionStatus::PastDue).unwrap(),
            "\"past_due\""
        );
        assert_eq!(SubscriptionStatus::IncompleteExpired.to_string(), "incomplete_expired");
    }

    #[test]
    fn terminal_states() {
        assert!(SubscriptionStatus::Canceled.is_terminal());
        assert!(SubscriptionStatus::IncompleteExpired.is_terminal());
        assert!(!SubscriptionStatus::Active.is_terminal());
        assert!(!SubscriptionStatus::PastDue.is_terminal());
    }

    #[test]
    fn primary_item_is_first() {
        let sub = subscription(vec![item("si_a", "price_a", 1), item("si_b", "price_b", 2)]);
        assert_eq!(sub.primary_item().unwrap().id, "si_a");
    }

    #[test]
    fn primary_item_absent_when_no_items() {
        let sub = subscription(vec![]);
        assert!(sub.primary_item().is_none());
    }
}
