//! Processor webhooks: signature verification and typed event decoding.

mod errors;
mod event;
mod signature;

pub use errors::WebhookError;
pub use event::{
    CheckoutCompletion, Event, EventData, EventPayload, EventRequest, ExpandableId,
    InvoicePayment, BILLING_REASON_SUBSCRIPTION_CREATE, CHECKOUT_SESSION_COMPLETED,
    INVOICE_PAID, INVOICE_PAYMENT_SUCCEEDED,
};
pub use signature::{sign, SignatureHeader, WebhookVerifier, DEFAULT_TOLERANCE_SECS};
