//! PreviewInvoiceHandler - quotes a change to an existing subscription or a new one.

use std::sync::Arc;

use crate::domain::billing::{
    split_invoice, BillingError, Invoice, ItemChange, PriceCatalog, ProrationSplit,
};
use crate::ports::{BillingBackend, InvoicePreviewRequest};

use super::change_subscription::{
    ChangeMode, ChangeSubscriptionCommand, SubscriptionChangeCoordinator,
};

/// Query for an invoice preview.
///
/// With `subscription_id` the quote is for changing that subscription.
/// Without it, `customer_id` and `new_price_lookup_key` describe a new one.
#[derive(Debug, Clone, Default)]
pub struct PreviewInvoiceQuery {
    pub subscription_id: Option<String>,
    pub customer_id: Option<String>,
    pub new_price_lookup_key: Option<String>,
    pub quantity: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct PreviewInvoiceResult {
    pub proration: ProrationSplit,
    pub invoice: Invoice,
}

pub struct PreviewInvoiceHandler {
    backend: Arc<dyn BillingBackend>,
    catalog: Arc<PriceCatalog>,
}

impl PreviewInvoiceHandler {
    pub fn new(backend: Arc<dyn BillingBackend>, catalog: Arc<PriceCatalog>) -> Self {
        Self { backend, catalog }
    }

    pub async fn handle(&self, query: PreviewInvoiceQuery) -> Result<PreviewInvoiceResult, BillingError> {
        match query.subscription_id {
            Some(subscription_id) => {
                let coordinator =
                    SubscriptionChangeCoordinator::new(self.backend.clone(), self.catalog.clone());
                let result = coordinator
                    .apply_change(
                        ChangeSubscriptionCommand {
                            subscription_id,
                            new_price_lookup_key: query.new_price_lookup_key,
                            quantity: query.quantity,
                            idempotency_key: None,
                        },
                        ChangeMode::Preview,
                    )
                    .await?;

                match (result.proration, result.invoice) {
                    (Some(proration), Some(invoice)) => Ok(PreviewInvoiceResult { proration, invoice }),
                    _ => Err(BillingError::UpstreamUnavailable(
                        "preview returned no quote".to_string(),
                    )),
                }
            }
            None => self.preview_new_subscription(query).await,
        }
    }

    /// Quote for a subscription that does not exist yet. Nothing is due immediately.
    async fn preview_new_subscription(
        &self,
        query: PreviewInvoiceQuery,
    ) -> Result<PreviewInvoiceResult, BillingError> {
        let customer_id = query
            .customer_id
            .ok_or_else(|| BillingError::validation("customerId", "required without subscriptionId"))?;
        let lookup_key = query.new_price_lookup_key.ok_or_else(|| {
            BillingError::validation("newPriceLookupKey", "required without subscriptionId")
        })?;
        let quantity = query.quantity.unwrap_or(1);
        if quantity == 0 {
            return Err(BillingError::validation("quantity", "must be at least 1"));
        }
        let price_id = self.catalog.resolve(&lookup_key)?;

        let invoice = self
            .backend
            .preview_invoice(InvoicePreviewRequest {
                customer_id,
                subscription_id: None,
                items: vec![ItemChange::Add {
                    price_id: price_id.to_string(),
                    quantity,
                }],
            })
            .await?;
        let proration = split_invoice(&invoice, None)?;

        Ok(PreviewInvoiceResult { proration, invoice })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stripe::MockBillingBackend;
    use crate::domain::billing::{InvoiceLineItem, Period};

    fn catalog() -> Arc<PriceCatalog> {
        Arc::new(PriceCatalog::new([("basic", "price_a"), ("premium", "price_b")]))
    }

    fn quote(lines: Vec<(i64, i64)>) -> Invoice {
        Invoice {
            id: None,
            customer_id: Some("cus_1".to_string()),
            subscription_id: None,
            currency: "usd".to_string(),
            lines: lines
                .into_iter()
                .map(|(amount, end)| InvoiceLineItem {
                    id: None,
                    amount,
                    currency: "usd".to_string(),
                    period: Period { start: end - 100, end },
                    proration: false,
                    description: None,
                    price_id: None,
                    quantity: None,
                })
                .collect(),
            amount_due: 0,
            total: 0,
            status: None,
            payment_intent: None,
        }
    }

    #[tokio::test]
    async fn new_subscription_quote_is_all_next_period() {
        let mock = MockBillingBackend::new();
        mock.set_preview(quote(vec![(300, 1000), (1200, 2600)]));
        let handler = PreviewInvoiceHandler::new(Arc::new(mock.clone()), catalog());

        let result = handler
            .handle(PreviewInvoiceQuery {
                customer_id: Some("cus_1".to_string()),
                new_price_lookup_key: Some("premium".to_string()),
                quantity: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(result.proration.immediate_total, 0);
        assert_eq!(result.proration.next_period_total, 1500);
        assert_eq!(
            mock.previews()[0].items,
            vec![ItemChange::Add {
                price_id: "price_b".to_string(),
                quantity: 2
            }]
        );
    }

    #[tokio::test]
    async fn existing_subscription_goes_through_coordinator() {
        let mock = MockBillingBackend::with_active_subscription("cus_1", "sub_1", "price_a", 2, 1000);
        mock.set_preview(quote(vec![(300, 1000), (1200, 2600)]));
        let handler = PreviewInvoiceHandler::new(Arc::new(mock.clone()), catalog());

        let result = handler
            .handle(PreviewInvoiceQuery {
                subscription_id: Some("sub_1".to_string()),
                new_price_lookup_key: Some("premium".to_string()),
                quantity: Some(5),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(result.proration.immediate_total, 300);
        assert_eq!(result.proration.next_period_total, 1200);
        assert_eq!(mock.write_count(), 0);
    }

    #[tokio::test]
    async fn new_subscription_requires_customer() {
        let handler = PreviewInvoiceHandler::new(Arc::new(MockBillingBackend::new()), catalog());

        let err = handler
            .handle(PreviewInvoiceQuery {
                new_price_lookup_key: Some("basic".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::Validation { field: "customerId", .. }));
    }
}
