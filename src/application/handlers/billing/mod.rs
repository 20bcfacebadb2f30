//! Billing handlers.
//!
//! ## Commands
//! - Creating customers and subscriptions
//! - Changing price/quantity (`SubscriptionChangeCoordinator`)
//! - Cancelling subscriptions
//! - Retrying an invoice with a new payment method
//! - Reporting metered usage
//!
//! ## Queries
//! - Listing a customer's subscriptions
//! - Previewing the invoice for a change
//! - One subscription's price, invoices and default card
//! - A saved payment method's card details

mod cancel_subscription;
mod change_subscription;
mod create_customer;
mod create_subscription;
mod list_subscriptions;
mod preview_invoice;
mod report_usage;
mod retrieve_payment_method;
mod retry_invoice;
mod subscription_information;

// Commands
pub use cancel_subscription::{CancelSubscriptionCommand, CancelSubscriptionHandler};
pub use change_subscription::{
    ChangeMode, ChangeSubscriptionCommand, ChangeSubscriptionResult, SubscriptionChangeCoordinator,
};
pub use create_customer::{CreateCustomerCommand, CreateCustomerHandler};
pub use create_subscription::{
    CreateSubscriptionCommand, CreateSubscriptionHandler, CreateSubscriptionResult,
};
pub use report_usage::{ReportUsageCommand, ReportUsageHandler};
pub use retry_invoice::{RetryInvoiceCommand, RetryInvoiceHandler};

// Queries
pub use list_subscriptions::{ListSubscriptionsHandler, ListSubscriptionsQuery};
pub use preview_invoice::{PreviewInvoiceHandler, PreviewInvoiceQuery, PreviewInvoiceResult};
pub use retrieve_payment_method::{RetrievePaymentMethodHandler, RetrievePaymentMethodQuery};
pub use subscription_information::{
    SubscriptionInformation, SubscriptionInformationHandler, SubscriptionInformationQuery,
};
