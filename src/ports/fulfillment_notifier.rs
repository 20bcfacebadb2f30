//! Fulfillment port.
//!
//! Called when a checkout includes an add-on that something outside the
//! billing system has to deliver (a download link, a shipment).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port for notifying fulfillment about a purchased add-on.
///
/// Implementations must tolerate repeated notifications for the same session.
#[async_trait]
pub trait FulfillmentNotifier: Send + Sync {
    async fn notify(&self, request: FulfillmentRequest) -> Result<(), FulfillmentError>;
}

/// What to fulfill and for whom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentRequest {
    pub customer_id: Option<String>,
    pub checkout_session_id: Option<String>,
    pub item_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FulfillmentError {
    #[error("Fulfillment unavailable: {0}")]
    Unavailable(String),

    #[error("Fulfillment rejected: {0}")]
    Rejected(String),
}
