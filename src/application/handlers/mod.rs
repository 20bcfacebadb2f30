//! Application handlers.
//!
//! - `billing` - Customer and subscription commands, invoice queries
//! - `webhooks` - Verified event intake and dispatch

pub mod billing;
pub mod webhooks;
