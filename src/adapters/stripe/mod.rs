//! Stripe billing backend adapter.
//!
//! Implements the `BillingBackend` port over the Stripe REST API, plus an
//! in-memory mock for tests.
//!
//! # Security
//!
//! - The secret key is held as `secrecy::SecretString` and never logged
//! - Stripe request ids are logged, never returned to callers
//! - Caller-supplied ids are percent-encoded into a single path segment

mod mock_billing_backend;
mod stripe_adapter;
mod wire_types;

pub use mock_billing_backend::{MethodCall, MockBillingBackend};
pub use stripe_adapter::{
    StripeBillingAdapter, StripeConfig, DEFAULT_API_BASE_URL, STRIPE_API_VERSION,
};
pub use wire_types::{
    Expandable, StripeCustomer, StripeErrorBody, StripeInvoice, StripeList, StripePaymentIntent,
    StripePaymentMethod, StripeSubscription, StripeUsageRecord,
};
