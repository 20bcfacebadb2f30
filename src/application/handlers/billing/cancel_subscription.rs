//! CancelSubscriptionHandler - cancels a subscription immediately.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Subscription};
use crate::ports::BillingBackend;

#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub subscription_id: String,
}

pub struct CancelSubscriptionHandler {
    backend: Arc<dyn BillingBackend>,
}

impl CancelSubscriptionHandler {
    pub fn new(backend: Arc<dyn BillingBackend>) -> Self {
        Self { backend }
    }

    /// Cancels the subscription. Already-terminal subscriptions are returned unchanged.
    pub async fn handle(&self, cmd: CancelSubscriptionCommand) -> Result<Subscription, BillingError> {
        let subscription = self
            .backend
            .get_subscription(&cmd.subscription_id)
            .await?
            .ok_or_else(|| BillingError::not_found("Subscription", &cmd.subscription_id))?;

        if subscription.status.is_terminal() {
            return Ok(subscription);
        }

        let canceled = self.backend.cancel_subscription(&subscription.id).await?;
        tracing::info!(subscription_id = %canceled.id, "Subscription canceled");
        Ok(canceled)
    }
}
