//! Ports - Interfaces for external dependencies.
//!
//! - `BillingBackend` - customers, subscriptions, invoices, payments, usage
//! - `FulfillmentNotifier` - delivery of purchased add-ons

mod billing_backend;
mod fulfillment_notifier;

pub use billing_backend::{
    BackendError, BackendErrorCode, BillingBackend, Card, CreateCustomerRequest,
    CreateSubscriptionRequest, CreatedSubscription, Customer, InvoicePreviewRequest,
    PaymentIntent, PaymentMethod, UpdateSubscriptionRequest, UsageRecordRequest,
};
pub use fulfillment_notifier::{FulfillmentError, FulfillmentNotifier, FulfillmentRequest};
