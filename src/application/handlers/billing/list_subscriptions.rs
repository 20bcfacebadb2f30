//! ListSubscriptionsHandler - a customer's subscriptions, any status.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Subscription};
use crate::ports::BillingBackend;

#[derive(Debug, Clone)]
pub struct ListSubscriptionsQuery {
    pub customer_id: String,
}

pub struct ListSubscriptionsHandler {
    backend: Arc<dyn BillingBackend>,
}

impl ListSubscriptionsHandler {
    pub fn new(backend: Arc<dyn BillingBackend>) -> Self {
        Self { backend }
    }

    pub async fn handle(&self, query: ListSubscriptionsQuery) -> Result<Vec<Subscription>, BillingError> {
        Ok(self.backend.list_subscriptions(&query.customer_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stripe::MockBillingBackend;

    #[tokio::test]
    async fn lists_only_the_customers_subscriptions() {
        let mock = MockBillingBackend::with_active_subscription("cus_1", "sub_1", "price_a", 1, 1000);
        let mut other = mock.subscription("sub_1").unwrap();
        other.id = "sub_2".to_string();
        other.customer_id = "cus_2".to_string();
        mock.add_subscription(other);

        let handler = ListSubscriptionsHandler::new(Arc::new(mock));
        let subscriptions = handler
            .handle(ListSubscriptionsQuery {
                customer_id: "cus_1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(subscriptions.len(), 1);
        assert_eq!(subscriptions[0].id, "sub_1");
    }
}
