//! Billing domain: subscriptions, invoices, and the pure rules for changing them.
//!
//! - `split_invoice` buckets a quoted invoice into due-now and due-at-renewal
//! - `plan_item_changes` picks quantity-update vs. replace for a change
//! - `UsageAction` says how metered usage combines with what is recorded

mod errors;
mod invoice;
mod item_change;
mod price_catalog;
mod proration;
mod subscription;
mod usage;

pub use errors::BillingError;
pub use invoice::{Invoice, InvoiceLineItem, InvoicePaymentIntent, Period};
pub use item_change::{plan_item_changes, ChangeStrategy, ItemChange};
pub use price_catalog::PriceCatalog;
pub use proration::{split_invoice, ProrationSplit};
pub use subscription::{Price, Subscription, SubscriptionItem, SubscriptionStatus};
pub use usage::{UsageAction, UsageRecord};
