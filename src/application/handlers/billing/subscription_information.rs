//! SubscriptionInformationHandler - everything an account page shows about one
//! subscription: current price and quantity, latest and upcoming invoice, and
//! the card that will be charged.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Invoice, Price, Subscription};
use crate::ports::{BillingBackend, Card, InvoicePreviewRequest};

#[derive(Debug, Clone)]
pub struct SubscriptionInformationQuery {
    pub subscription_id: String,
}

#[derive(Debug, Clone)]
pub struct SubscriptionInformation {
    pub subscription: Subscription,
    pub current_price: Option<Price>,
    pub current_quantity: Option<u64>,
    pub latest_invoice: Option<Invoice>,

    /// `None` once the subscription will not renew.
    pub upcoming_invoice: Option<Invoice>,

    /// Card of the default payment method, subscription's own before the customer's.
    pub card: Option<Card>,
}

pub struct SubscriptionInformationHandler {
    backend: Arc<dyn BillingBackend>,
}

impl SubscriptionInformationHandler {
    pub fn new(backend: Arc<dyn BillingBackend>) -> Self {
        Self { backend }
    }

    pub async fn handle(
        &self,
        query: SubscriptionInformationQuery,
    ) -> Result<SubscriptionInformation, BillingError> {
        if query.subscription_id.trim().is_empty() {
            return Err(BillingError::validation("subscriptionId", "must not be empty"));
        }

        let subscription = self
            .backend
            .get_subscription(&query.subscription_id)
            .await?
            .ok_or_else(|| BillingError::not_found("Subscription", &query.subscription_id))?;

        let latest_invoice = match subscription.latest_invoice_id.as_deref() {
            Some(invoice_id) => self.backend.get_invoice(invoice_id).await?,
            None => None,
        };

        let renews = !subscription.status.is_terminal() && !subscription.cancel_at_period_end;
        let upcoming_invoice = if renews {
            Some(
                self.backend
                    .preview_invoice(InvoicePreviewRequest {
                        customer_id: subscription.customer_id.clone(),
                        subscription_id: Some(subscription.id.clone()),
                        items: Vec::new(),
                    })
                    .await?,
            )
        } else {
            None
        };

        let card = self.default_card(&subscription).await?;
        let primary = subscription.primary_item();

        Ok(SubscriptionInformation {
            current_price: primary.map(|item| item.price.clone()),
            current_quantity: primary.map(|item| item.quantity),
            subscription,
            latest_invoice,
            upcoming_invoice,
            card,
        })
    }

    async fn default_card(&self, subscription: &Subscription) -> Result<Option<Card>, BillingError> {
        let payment_method_id = match subscription.default_payment_method.clone() {
            Some(id) => Some(id),
            None => self
                .backend
                .get_customer(&subscription.customer_id)
                .await?
                .and_then(|customer| customer.default_payment_method),
        };

        let Some(payment_method_id) = payment_method_id else {
            return Ok(None);
        };

        Ok(self
            .backend
            .get_payment_method(&payment_method_id)
            .await?
            .and_then(|method| method.card))
    }
}
