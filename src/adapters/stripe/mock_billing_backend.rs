//! Mock billing backend for testing.
//!
//! In-memory implementation of `BillingBackend` for unit and integration
//! tests. Supports:
//! - Seeded customers, subscriptions, invoices, payment intents and methods
//! - A configurable preview quote
//! - Error injection
//! - Call tracking, including the exact update/preview requests submitted

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::billing::{
    Invoice, InvoicePaymentIntent, ItemChange, Price, Subscription, SubscriptionItem,
    SubscriptionStatus, UsageRecord,
};
use crate::ports::{
    BackendError, BillingBackend, CreateCustomerRequest, CreateSubscriptionRequest,
    CreatedSubscription, Customer, InvoicePreviewRequest, PaymentIntent, PaymentMethod,
    UpdateSubscriptionRequest, UsageRecordRequest,
};

const THIRTY_DAYS_SECS: i64 = 30 * 24 * 60 * 60;

/// Mock billing backend for testing.
///
/// Clones share state, so a test can keep a handle while the service owns another.
#[derive(Default)]
pub struct MockBillingBackend {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    customers: HashMap<String, Customer>,
    subscriptions: HashMap<String, Subscription>,
    invoices: HashMap<String, Invoice>,
    payment_intents: HashMap<String, PaymentIntent>,
    payment_methods: HashMap<String, PaymentMethod>,

    /// Quote returned by every `preview_invoice` call.
    preview: Option<Invoice>,

    /// Error to return on the next call to any method.
    next_error: Option<BackendError>,

    /// Errors by method name.
    method_errors: HashMap<String, BackendError>,

    call_log: Vec<MethodCall>,
    updates: Vec<UpdateSubscriptionRequest>,
    previews: Vec<InvoicePreviewRequest>,
    usage_records: Vec<UsageRecordRequest>,
    next_id: u64,
}

impl MockState {
    fn generate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_mock_{}", prefix, self.next_id)
    }
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockBillingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    pub fn add_customer(&self, customer: Customer) {
        let id = customer.id.clone();
        self.inner.lock().unwrap().customers.insert(id, customer);
    }

    pub fn add_subscription(&self, subscription: Subscription) {
        let id = subscription.id.clone();
        self.inner
            .lock()
            .unwrap()
            .subscriptions
            .insert(id, subscription);
    }

    pub fn add_invoice(&self, invoice: Invoice) {
        if let Some(id) = invoice.id.clone() {
            self.inner.lock().unwrap().invoices.insert(id, invoice);
        }
    }

    pub fn add_payment_intent(&self, payment_intent: PaymentIntent) {
        let id = payment_intent.id.clone();
        self.inner
            .lock()
            .unwrap()
            .payment_intents
            .insert(id, payment_intent);
    }

    pub fn add_payment_method(&self, payment_method: PaymentMethod) {
        let id = payment_method.id.clone();
        self.inner
            .lock()
            .unwrap()
            .payment_methods
            .insert(id, payment_method);
    }

    /// Set the quote every `preview_invoice` call returns.
    pub fn set_preview(&self, invoice: Invoice) {
        self.inner.lock().unwrap().preview = Some(invoice);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: BackendError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: BackendError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.inner.lock().unwrap();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Inspection
    // ════════════════════════════════════════════════════════════════════════════

    pub fn subscription(&self, subscription_id: &str) -> Option<Subscription> {
        self.inner
            .lock()
            .unwrap()
            .subscriptions
            .get(subscription_id)
            .cloned()
    }

    pub fn customer(&self, customer_id: &str) -> Option<Customer> {
        self.inner.lock().unwrap().customers.get(customer_id).cloned()
    }

    /// Every `update_subscription` request, in call order.
    pub fn updates(&self) -> Vec<UpdateSubscriptionRequest> {
        self.inner.lock().unwrap().updates.clone()
    }

    /// Every `preview_invoice` request, in call order.
    pub fn previews(&self) -> Vec<InvoicePreviewRequest> {
        self.inner.lock().unwrap().previews.clone()
    }

    /// Every `report_usage` request, in call order.
    pub fn usage_reports(&self) -> Vec<UsageRecordRequest> {
        self.inner.lock().unwrap().usage_records.clone()
    }

    pub fn invoice(&self, invoice_id: &str) -> Option<Invoice> {
        self.inner.lock().unwrap().invoices.get(invoice_id).cloned()
    }

    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Number of calls that change backend state.
    pub fn write_count(&self) -> usize {
        const WRITES: [&str; 8] = [
            "create_customer",
            "create_subscription",
            "cancel_subscription",
            "update_subscription",
            "attach_payment_method",
            "set_customer_default_payment_method",
            "set_subscription_default_payment_method",
            "report_usage",
        ];
        WRITES.iter().map(|method| self.call_count(method)).sum()
    }

    pub fn clear_calls(&self) {
        let mut state = self.inner.lock().unwrap();
        state.call_log.clear();
        state.updates.clear();
        state.previews.clear();
        state.usage_records.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.inner.lock().unwrap().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), BackendError> {
        let mut state = self.inner.lock().unwrap();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

impl Clone for MockBillingBackend {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn mock_price(price_id: &str, currency: &str) -> Price {
    Price {
        id: price_id.to_string(),
        currency: currency.to_string(),
        unit_amount: None,
        lookup_key: None,
        interval: Some("month".to_string()),
    }
}

#[async_trait]
impl BillingBackend for MockBillingBackend {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, BackendError> {
        self.record_call("create_customer", vec![request.email.clone()]);
        self.check_error("create_customer")?;

        let mut state = self.inner.lock().unwrap();
        let customer = Customer {
            id: state.generate_id("cus"),
            email: Some(request.email),
            name: request.name,
            default_payment_method: None,
        };
        state.customers.insert(customer.id.clone(), customer.clone());

        Ok(customer)
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, BackendError> {
        self.record_call("get_customer", vec![customer_id.to_string()]);
        self.check_error("get_customer")?;

        Ok(self.customer(customer_id))
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<CreatedSubscription, BackendError> {
        self.record_call(
            "create_subscription",
            vec![
                request.customer_id.clone(),
                request.price_id.clone(),
                request.quantity.to_string(),
            ],
        );
        self.check_error("create_subscription")?;

        let mut state = self.inner.lock().unwrap();
        if !state.customers.contains_key(&request.customer_id) {
            return Err(BackendError::rejected(format!(
                "No such customer: '{}'",
                request.customer_id
            )));
        }

        let now = chrono::Utc::now().timestamp();
        let invoice_id = state.generate_id("in");
        let subscription = Subscription {
            id: state.generate_id("sub"),
            customer_id: request.customer_id,
            status: SubscriptionStatus::Incomplete,
            items: vec![SubscriptionItem {
                id: state.generate_id("si"),
                price: mock_price(&request.price_id, "usd"),
                quantity: request.quantity,
            }],
            current_period_start: now,
            current_period_end: now + THIRTY_DAYS_SECS,
            default_payment_method: None,
            cancel_at_period_end: false,
            canceled_at: None,
            latest_invoice_id: Some(invoice_id.clone()),
        };
        let payment_intent = PaymentIntent {
            id: state.generate_id("pi"),
            status: "requires_payment_method".to_string(),
            payment_method: None,
            client_secret: None,
        };
        let client_secret = format!("{}_secret", payment_intent.id);

        state
            .subscriptions
            .insert(subscription.id.clone(), subscription.clone());
        state.invoices.insert(
            invoice_id.clone(),
            Invoice {
                id: Some(invoice_id),
                customer_id: Some(subscription.customer_id.clone()),
                subscription_id: Some(subscription.id.clone()),
                currency: "usd".to_string(),
                lines: Vec::new(),
                amount_due: 0,
                total: 0,
                status: Some("open".to_string()),
                payment_intent: Some(InvoicePaymentIntent {
                    id: payment_intent.id.clone(),
                    status: Some(payment_intent.status.clone()),
                    client_secret: Some(client_secret.clone()),
                }),
            },
        );
        state.payment_intents.insert(
            payment_intent.id.clone(),
            PaymentIntent {
                client_secret: Some(client_secret.clone()),
                ..payment_intent
            },
        );

        Ok(CreatedSubscription {
            subscription,
            client_secret: Some(client_secret),
        })
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, BackendError> {
        self.record_call("get_subscription", vec![subscription_id.to_string()]);
        self.check_error("get_subscription")?;

        Ok(self.subscription(subscription_id))
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
    ) -> Result<Vec<Subscription>, BackendError> {
        self.record_call("list_subscriptions", vec![customer_id.to_string()]);
        self.check_error("list_subscriptions")?;

        let state = self.inner.lock().unwrap();
        let mut subscriptions: Vec<Subscription> = state
            .subscriptions
            .values()
            .filter(|s| s.customer_id == customer_id)
            .cloned()
            .collect();
        subscriptions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(subscriptions)
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, BackendError> {
        self.record_call("cancel_subscription", vec![subscription_id.to_string()]);
        self.check_error("cancel_subscription")?;

        let mut state = self.inner.lock().unwrap();
        let subscription = state
            .subscriptions
            .get_mut(subscription_id)
            .ok_or_else(|| BackendError::not_found("Subscription"))?;

        subscription.status = SubscriptionStatus::Canceled;
        subscription.canceled_at = Some(chrono::Utc::now().timestamp());

        Ok(subscription.clone())
    }

    async fn update_subscription(
        &self,
        request: UpdateSubscriptionRequest,
    ) -> Result<Subscription, BackendError> {
        self.record_call(
            "update_subscription",
            vec![request.subscription_id.clone(), format!("{:?}", request.items)],
        );
        self.check_error("update_subscription")?;

        let mut state = self.inner.lock().unwrap();
        state.updates.push(request.clone());

        let mut next_item_ids = Vec::new();
        for change in &request.items {
            if matches!(change, ItemChange::Add { .. }) {
                next_item_ids.push(state.generate_id("si"));
            }
        }

        let subscription = state
            .subscriptions
            .get_mut(&request.subscription_id)
            .ok_or_else(|| BackendError::not_found("Subscription"))?;
        let currency = subscription
            .primary_item()
            .map(|item| item.price.currency.clone())
            .unwrap_or_else(|| "usd".to_string());

        let mut new_ids = next_item_ids.into_iter();
        for change in request.items {
            match change {
                ItemChange::Update { id, quantity } => {
                    let item = subscription
                        .items
                        .iter_mut()
                        .find(|item| item.id == id)
                        .ok_or_else(|| {
                            BackendError::rejected(format!("No such subscription item: '{}'", id))
                        })?;
                    item.quantity = quantity;
                }
                ItemChange::Delete { id } => {
                    subscription.items.retain(|item| item.id != id);
                }
                ItemChange::Add { price_id, quantity } => {
                    subscription.items.push(SubscriptionItem {
                        id: new_ids.next().unwrap_or_default(),
                        price: mock_price(&price_id, &currency),
                        quantity,
                    });
                }
            }
        }

        Ok(subscription.clone())
    }

    async fn preview_invoice(
        &self,
        request: InvoicePreviewRequest,
    ) -> Result<Invoice, BackendError> {
        self.record_call(
            "preview_invoice",
            vec![
                request.customer_id.clone(),
                request.subscription_id.clone().unwrap_or_default(),
            ],
        );
        self.check_error("preview_invoice")?;

        let mut state = self.inner.lock().unwrap();
        state.previews.push(request.clone());

        Ok(state.preview.clone().unwrap_or_else(|| Invoice {
            id: None,
            customer_id: Some(request.customer_id),
            subscription_id: request.subscription_id,
            currency: "usd".to_string(),
            lines: Vec::new(),
            amount_due: 0,
            total: 0,
            status: None,
            payment_intent: None,
        }))
    }

    async fn get_invoice(&self, invoice_id: &str) -> Result<Option<Invoice>, BackendError> {
        self.record_call("get_invoice", vec![invoice_id.to_string()]);
        self.check_error("get_invoice")?;

        Ok(self.inner.lock().unwrap().invoices.get(invoice_id).cloned())
    }

    async fn get_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<PaymentIntent>, BackendError> {
        self.record_call("get_payment_intent", vec![payment_intent_id.to_string()]);
        self.check_error("get_payment_intent")?;

        Ok(self
            .inner
            .lock()
            .unwrap()
            .payment_intents
            .get(payment_intent_id)
            .cloned())
    }

    async fn get_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<Option<PaymentMethod>, BackendError> {
        self.record_call("get_payment_method", vec![payment_method_id.to_string()]);
        self.check_error("get_payment_method")?;

        Ok(self
            .inner
            .lock()
            .unwrap()
            .payment_methods
            .get(payment_method_id)
            .cloned())
    }

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<(), BackendError> {
        self.record_call(
            "attach_payment_method",
            vec![payment_method_id.to_string(), customer_id.to_string()],
        );
        self.check_error("attach_payment_method")?;

        if self.customer(customer_id).is_none() {
            return Err(BackendError::rejected(format!(
                "No such customer: '{}'",
                customer_id
            )));
        }
        Ok(())
    }

    async fn set_customer_default_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<Customer, BackendError> {
        self.record_call(
            "set_customer_default_payment_method",
            vec![customer_id.to_string(), payment_method_id.to_string()],
        );
        self.check_error("set_customer_default_payment_method")?;

        let mut state = self.inner.lock().unwrap();
        let customer = state
            .customers
            .get_mut(customer_id)
            .ok_or_else(|| BackendError::not_found("Customer"))?;
        customer.default_payment_method = Some(payment_method_id.to_string());

        Ok(customer.clone())
    }

    async fn set_subscription_default_payment_method(
        &self,
        subscription_id: &str,
        payment_method_id: &str,
    ) -> Result<Subscription, BackendError> {
        self.record_call(
            "set_subscription_default_payment_method",
            vec![subscription_id.to_string(), payment_method_id.to_string()],
        );
        self.check_error("set_subscription_default_payment_method")?;

        let mut state = self.inner.lock().unwrap();
        let subscription = state
            .subscriptions
            .get_mut(subscription_id)
            .ok_or_else(|| BackendError::not_found("Subscription"))?;
        subscription.default_payment_method = Some(payment_method_id.to_string());

        Ok(subscription.clone())
    }

    async fn report_usage(&self, request: UsageRecordRequest) -> Result<UsageRecord, BackendError> {
        self.record_call(
            "report_usage",
            vec![
                request.subscription_item_id.clone(),
                request.quantity.to_string(),
                request.action.as_str().to_string(),
            ],
        );
        self.check_error("report_usage")?;

        let mut state = self.inner.lock().unwrap();
        let item_exists = state
            .subscriptions
            .values()
            .flat_map(|s| s.items.iter())
            .any(|item| item.id == request.subscription_item_id);
        if !item_exists {
            return Err(BackendError::rejected(format!(
                "No such subscription item: '{}'",
                request.subscription_item_id
            )));
        }

        state.usage_records.push(request.clone());
        Ok(UsageRecord {
            id: state.generate_id("mbur"),
            subscription_item_id: request.subscription_item_id,
            quantity: request.quantity,
            timestamp: request
                .timestamp
                .unwrap_or_else(|| chrono::Utc::now().timestamp()),
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Test Helpers
// ════════════════════════════════════════════════════════════════════════════════

impl MockBillingBackend {
    /// Create a mock with one customer and one active single-item subscription.
    pub fn with_active_subscription(
        customer_id: &str,
        subscription_id: &str,
        price_id: &str,
        quantity: u64,
        current_period_end: i64,
    ) -> Self {
        let mock = Self::new();

        mock.add_customer(Customer {
            id: customer_id.to_string(),
            email: Some("test@example.com".to_string()),
            name: None,
            default_payment_method: None,
        });

        mock.add_subscription(Subscription {
            id: subscription_id.to_string(),
            customer_id: customer_id.to_string(),
            status: SubscriptionStatus::Active,
            items: vec![SubscriptionItem {
                id: "si_current".to_string(),
                price: mock_price(price_id, "usd"),
                quantity,
            }],
            current_period_start: current_period_end - THIRTY_DAYS_SECS,
            current_period_end,
            default_payment_method: None,
            cancel_at_period_end: false,
            canceled_at: None,
            latest_invoice_id: None,
        });

        mock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_customer_assigns_id() {
        let mock = MockBillingBackend::new();
        let customer = mock
            .create_customer(CreateCustomerRequest {
                email: "jenny@example.com".to_string(),
                name: None,
            })
            .await
            .unwrap();

        assert!(customer.id.starts_with("cus_mock_"));
        assert_eq!(mock.customer(&customer.id), Some(customer));
    }

    #[tokio::test]
    async fn update_applies_replace_in_one_call() {
        let mock = MockBillingBackend::with_active_subscription("cus_1", "sub_1", "price_a", 2, 1000);

        let updated = mock
            .update_subscription(UpdateSubscriptionRequest {
                subscription_id: "sub_1".to_string(),
                items: vec![
                    ItemChange::Delete {
                        id: "si_current".to_string(),
                    },
                    ItemChange::Add {
                        price_id: "price_b".to_string(),
                        quantity: 5,
                    },
                ],
                idempotency_key: None,
            })
            .await
            .unwrap();

        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.items[0].price.id, "price_b");
        assert_eq!(updated.items[0].quantity, 5);
        assert_eq!(mock.updates().len(), 1);
    }

    #[tokio::test]
    async fn method_error_only_affects_method() {
        let mock = MockBillingBackend::with_active_subscription("cus_1", "sub_1", "price_a", 1, 1000);
        mock.set_method_error("cancel_subscription", BackendError::rejected("nope"));

        assert!(mock.get_subscription("sub_1").await.unwrap().is_some());
        assert!(mock.cancel_subscription("sub_1").await.is_err());
    }

    #[tokio::test]
    async fn global_error_is_consumed() {
        let mock = MockBillingBackend::new();
        mock.set_error(BackendError::network("down"));

        assert!(mock.get_customer("cus_1").await.is_err());
        assert!(mock.get_customer("cus_1").await.is_ok());
    }

    #[tokio::test]
    async fn write_count_ignores_reads() {
        let mock = MockBillingBackend::with_active_subscription("cus_1", "sub_1", "price_a", 1, 1000);
        mock.get_subscription("sub_1").await.unwrap();
        mock.preview_invoice(InvoicePreviewRequest {
            customer_id: "cus_1".to_string(),
            subscription_id: Some("sub_1".to_string()),
            items: vec![],
        })
        .await
        .unwrap();

        assert_eq!(mock.write_count(), 0);
        assert_eq!(mock.call_count("preview_invoice"), 1);
    }
}
