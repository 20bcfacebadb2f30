//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (error classification)
//! - `billing` - Subscriptions, invoices, proration and change planning
//! - `webhook` - Signed processor events: verification and typed payloads

pub mod billing;
pub mod foundation;
pub mod webhook;
