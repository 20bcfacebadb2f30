//! CreateCustomerHandler - registers a storefront customer with the backend.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::ports::{BillingBackend, CreateCustomerRequest, Customer};

#[derive(Debug, Clone)]
pub struct CreateCustomerCommand {
    pub email: String,
    pub name: Option<String>,
}

pub struct CreateCustomerHandler {
    backend: Arc<dyn BillingBackend>,
}

impl CreateCustomerHandler {
    pub fn new(backend: Arc<dyn BillingBackend>) -> Self {
        Self { backend }
    }

    pub async fn handle(&self, cmd: CreateCustomerCommand) -> Result<Customer, BillingError> {
        let email = cmd.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(BillingError::validation("email", "must be an email address"));
        }

        let customer = self
            .backend
            .create_customer(CreateCustomerRequest {
                email: email.to_string(),
                name: cmd.name,
            })
            .await?;

        tracing::info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }
}
