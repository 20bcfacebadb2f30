//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `stripe` - Billing backend over the Stripe REST API (plus an in-memory mock)
//! - `fulfillment` - Fulfillment notifiers
//! - `http` - Axum REST API

pub mod fulfillment;
pub mod http;
pub mod stripe;

pub use fulfillment::{LoggingFulfillmentNotifier, RecordingFulfillmentNotifier};
pub use stripe::{MockBillingBackend, StripeBillingAdapter, StripeConfig};
