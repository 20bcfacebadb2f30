//! Storefront Billing - recurring billing backend for a web storefront.
//!
//! Manages customers and single-item subscriptions through a billing
//! backend (Stripe), quotes price/quantity changes with a due-now versus
//! due-at-renewal split, and reconciles signed webhook events.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
