//! Webhook handlers: verification and event dispatch.

mod dispatch_event;
mod handle_webhook;

pub use dispatch_event::{DispatchOutcome, EventDispatcher};
pub use handle_webhook::{HandleWebhookCommand, HandleWebhookHandler, HandleWebhookResult};
