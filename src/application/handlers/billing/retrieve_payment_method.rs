//! RetrievePaymentMethodHandler - card details for displaying a saved payment method.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::ports::{BillingBackend, PaymentMethod};

#[derive(Debug, Clone)]
pub struct RetrievePaymentMethodQuery {
    pub payment_method_id: String,

    /// When known, a method attached to a different customer is reported as missing.
    pub customer_id: Option<String>,
}

pub struct RetrievePaymentMethodHandler {
    backend: Arc<dyn BillingBackend>,
}

impl RetrievePaymentMethodHandler {
    pub fn new(backend: Arc<dyn BillingBackend>) -> Self {
        Self { backend }
    }

    pub async fn handle(&self, query: RetrievePaymentMethodQuery) -> Result<PaymentMethod, BillingError> {
        if query.payment_method_id.trim().is_empty() {
            return Err(BillingError::validation("paymentMethodId", "must not be empty"));
        }

        let not_found = || BillingError::not_found("PaymentMethod", &query.payment_method_id);
        let method = self
            .backend
            .get_payment_method(&query.payment_method_id)
            .await?
            .ok_or_else(not_found)?;

        let owners = (query.customer_id.as_deref(), method.customer_id.as_deref());
        if let (Some(caller), Some(owner)) = owners {
            if caller != owner {
                return Err(not_found());
            }
        }
        Ok(method)
    }
}
