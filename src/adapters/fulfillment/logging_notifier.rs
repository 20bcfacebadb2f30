//! Fulfillment notifier that writes a structured log line per request.
//!
//! Stands in until a real fulfillment system is connected; operators pick
//! the requests up from the log stream.

use async_trait::async_trait;

use crate::ports::{FulfillmentError, FulfillmentNotifier, FulfillmentRequest};

#[derive(Debug, Clone, Default)]
pub struct LoggingFulfillmentNotifier;

impl LoggingFulfillmentNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FulfillmentNotifier for LoggingFulfillmentNotifier {
    async fn notify(&self, request: FulfillmentRequest) -> Result<(), FulfillmentError> {
        tracing::info!(
            customer_id = request.customer_id.as_deref().unwrap_or_default(),
            checkout_session_id = request.checkout_session_id.as_deref().unwrap_or_default(),
            item_name = %request.item_name,
            "Fulfillment requested"
        );
        Ok(())
    }
}
