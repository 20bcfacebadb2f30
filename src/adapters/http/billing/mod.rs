//! HTTP adapter for billing endpoints.
//!
//! Exposes subscription management and webhook intake as a JSON API with
//! camelCase fields. Errors use the `{"error": {"message": ...}}` envelope.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{BillingAppState, CustomerIdentity, CUSTOMER_COOKIE, SIGNATURE_HEADER};
pub use routes::{billing_routes, router, webhook_routes};
