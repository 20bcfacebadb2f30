//! Splits a quoted invoice into what is due now and what is due at renewal.
//!
//! The backend already priced every line; this module only buckets and sums.
//! All arithmetic is on `i64` minor units with overflow checks.

use serde::Serialize;

use super::errors::BillingError;
use super::invoice::Invoice;

/// Result of splitting an invoice at the subscription's current period end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProrationSplit {
    /// Lowercase ISO currency code shared by every line.
    pub currency: String,

    /// Charged now: proration credits/debits and the remainder of the active period.
    pub immediate_total: i64,

    /// Charged at the next renewal under the new price/quantity.
    pub next_period_total: i64,
}

impl ProrationSplit {
    /// Sum of both buckets. `None` on overflow.
    pub fn total(&self) -> Option<i64> {
        self.immediate_total.checked_add(self.next_period_total)
    }
}

/// Buckets the invoice's line items by period end.
///
/// Lines whose `period.end` equals `current_period_end` belong to the active
/// period and are due immediately; every other line is next-period. When
/// there is no current period (brand-new subscription) the whole quote is
/// next-period and nothing is due immediately.
///
/// # Errors
///
/// - `CurrencyMismatch` if lines (or the invoice header) disagree on currency
/// - `Validation` if a bucket sum overflows
pub fn split_invoice(
    invoice: &Invoice,
    current_period_end: Option<i64>,
) -> Result<ProrationSplit, BillingError> {
    let currency = shared_currency(invoice)?;

    let mut immediate_total: i64 = 0;
    let mut next_period_total: i64 = 0;

    for line in &invoice.lines {
        let bucket = match current_period_end {
            Some(end) if line.period.end == end => &mut immediate_total,
            _ => &mut next_period_total,
        };
        *bucket = bucket
            .checked_add(line.amount)
            .ok_or_else(|| BillingError::validation("invoice", "line item total overflows"))?;
    }

    Ok(ProrationSplit {
        currency,
        immediate_total,
        next_period_total,
    })
}

/// Returns the single currency used by the invoice, lowercased.
fn shared_currency(invoice: &Invoice) -> Result<String, BillingError> {
    let mut expected: Option<&str> = (!invoice.currency.is_empty()).then_some(&invoice.currency);

    for line in &invoice.lines {
        match expected {
            None => expected = Some(&line.currency),
            Some(currency) if currency.eq_ignore_ascii_case(&line.currency) => {}
            Some(currency) => {
                return Err(BillingError::CurrencyMismatch {
                    expected: currency.to_ascii_lowercase(),
                    found: line.currency.to_ascii_lowercase(),
                })
            }
        }
    }

    Ok(expected.map(str::to_ascii_lowercase).unwrap_or_default())
}
