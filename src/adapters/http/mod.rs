//! HTTP adapters - REST API implementations.

pub mod billing;

// Re-export key types for convenience
pub use billing::{router, BillingAppState};
