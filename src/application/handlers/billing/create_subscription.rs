//! CreateSubscriptionHandler - starts a subscription awaiting its first payment.

use std::sync::Arc;

use crate::domain::billing::{BillingError, PriceCatalog, Subscription};
use crate::ports::{BillingBackend, CreateSubscriptionRequest};

#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    pub customer_id: String,
    pub price_lookup_key: String,

    /// Defaults to 1.
    pub quantity: Option<u64>,

    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateSubscriptionResult {
    pub subscription: Subscription,

    /// Secret the client confirms the first payment with.
    pub client_secret: Option<String>,
}

pub struct CreateSubscriptionHandler {
    backend: Arc<dyn BillingBackend>,
    catalog: Arc<PriceCatalog>,
}

impl CreateSubscriptionHandler {
    pub fn new(backend: Arc<dyn BillingBackend>, catalog: Arc<PriceCatalog>) -> Self {
        Self { backend, catalog }
    }

    pub async fn handle(
        &self,
        cmd: CreateSubscriptionCommand,
    ) -> Result<CreateSubscriptionResult, BillingError> {
        let quantity = cmd.quantity.unwrap_or(1);
        if quantity == 0 {
            return Err(BillingError::validation("quantity", "must be at least 1"));
        }
        let price_id = self.catalog.resolve(&cmd.price_lookup_key)?;

        let created = self
            .backend
            .create_subscription(CreateSubscriptionRequest {
                customer_id: cmd.customer_id,
                price_id: price_id.to_string(),
                quantity,
                idempotency_key: cmd.idempotency_key,
            })
            .await?;

        tracing::info!(
            subscription_id = %created.subscription.id,
            customer_id = %created.subscription.customer_id,
            price_id,
            quantity,
            "Subscription created"
        );

        Ok(CreateSubscriptionResult {
            subscription: created.subscription,
            client_secret: created.client_secret,
        })
    }
}
