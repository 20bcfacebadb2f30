//! Invoices, real or previewed.

use serde::{Deserialize, Serialize};

/// Service period a line item covers (Unix timestamps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: i64,
    pub end: i64,
}

/// One charge or credit on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub id: Option<String>,

    /// Signed amount in minor currency units. Credits are negative.
    pub amount: i64,

    /// Lowercase ISO currency code.
    pub currency: String,

    pub period: Period,

    /// Whether the backend generated this line to prorate a mid-cycle change.
    pub proration: bool,

    pub description: Option<String>,
    pub price_id: Option<String>,
    pub quantity: Option<u64>,
}

/// Payment intent collecting an invoice.
///
/// Only `id` is known unless the backend expanded the intent. `status` and
/// `client_secret` let a client finish a payment that needs customer action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicePaymentIntent {
    pub id: String,
    pub status: Option<String>,
    pub client_secret: Option<String>,
}

impl InvoicePaymentIntent {
    /// An unexpanded reference.
    pub fn reference(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: None,
            client_secret: None,
        }
    }
}

/// An invoice. Previews have no `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Option<String>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub currency: String,
    pub lines: Vec<InvoiceLineItem>,
    pub amount_due: i64,
    pub total: i64,
    pub status: Option<String>,
    pub payment_intent: Option<InvoicePaymentIntent>,
}

impl Invoice {
    /// Whether this is a non-committing quote rather than an issued invoice.
    pub fn is_preview(&self) -> bool {
        self.id.is_none()
    }

    /// Line items the backend added to prorate a change.
    pub fn proration_lines(&self) -> impl Iterator<Item = &InvoiceLineItem> {
        self.lines.iter().filter(|line| line.proration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(amount: i64, proration: bool) -> InvoiceLineItem {
        InvoiceLineItem {
            id: None,
            amount,
            currency: "usd".to_string(),
            period: Period { start: 0, end: 1000 },
            proration,
            description: None,
            price_id: None,
            quantity: None,
        }
    }

    #[test]
    fn preview_has_no_id() {
        let invoice = Invoice {
            id: None,
            customer_id: Some("cus_1".to_string()),
            subscription_id: None,
            currency: "usd".to_string(),
            lines: vec![],
            amount_due: 0,
            total: 0,
            status: None,
            payment_intent: None,
        };
        assert!(invoice.is_preview());
    }

    #[test]
    fn proration_lines_filters_flagged_items() {
        let invoice = Invoice {
            id: Some("in_1".to_string()),
            customer_id: None,
            subscription_id: None,
            currency: "usd".to_string(),
            lines: vec![line(-200, true), line(500, true), line(1200, false)],
            amount_due: 1500,
            total: 1500,
            status: Some("draft".to_string()),
            payment_intent: None,
        };
        let amounts: Vec<i64> = invoice.proration_lines().map(|l| l.amount).collect();
        assert_eq!(amounts, vec![-200, 500]);
    }
}
