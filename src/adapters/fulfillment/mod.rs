//! Fulfillment notifier adapters.
//!
//! - `LoggingFulfillmentNotifier` - records the request in the service log
//! - `RecordingFulfillmentNotifier` - keeps requests in memory for tests

mod logging_notifier;
mod recording_notifier;

pub use logging_notifier::LoggingFulfillmentNotifier;
pub use recording_notifier::RecordingFulfillmentNotifier;
