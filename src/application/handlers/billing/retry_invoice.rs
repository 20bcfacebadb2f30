//! RetryInvoiceHandler - pays an open invoice with a new payment method.
//!
//! Attaches the payment method to the customer and makes it the default for
//! invoices; the backend's automatic collection then retries the invoice.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Invoice};
use crate::ports::BillingBackend;

#[derive(Debug, Clone)]
pub struct RetryInvoiceCommand {
    pub customer_id: String,
    pub payment_method_id: String,
    pub invoice_id: String,
}

pub struct RetryInvoiceHandler {
    backend: Arc<dyn BillingBackend>,
}

impl RetryInvoiceHandler {
    pub fn new(backend: Arc<dyn BillingBackend>) -> Self {
        Self { backend }
    }

    pub async fn handle(&self, cmd: RetryInvoiceCommand) -> Result<Invoice, BillingError> {
        if cmd.payment_method_id.trim().is_empty() {
            return Err(BillingError::validation("paymentMethodId", "must not be empty"));
        }

        self.backend
            .attach_payment_method(&cmd.payment_method_id, &cmd.customer_id)
            .await?;
        self.backend
            .set_customer_default_payment_method(&cmd.customer_id, &cmd.payment_method_id)
            .await?;

        let invoice = self
            .backend
            .get_invoice(&cmd.invoice_id)
            .await?
            .ok_or_else(|| BillingError::not_found("Invoice", &cmd.invoice_id))?;

        tracing::info!(
            customer_id = %cmd.customer_id,
            invoice_id = %cmd.invoice_id,
            "Payment method replaced for invoice retry"
        );
        Ok(invoice)
    }
}
