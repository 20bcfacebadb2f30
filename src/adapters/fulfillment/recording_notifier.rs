//! In-memory fulfillment notifier for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{FulfillmentError, FulfillmentNotifier, FulfillmentRequest};

/// Records every request. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingFulfillmentNotifier {
    inner: Arc<Mutex<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    requests: Vec<FulfillmentRequest>,
    failure: Option<String>,
}

impl RecordingFulfillmentNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `notify` fail with `Unavailable`.
    pub fn fail_with(&self, message: &str) {
        self.inner.lock().unwrap().failure = Some(message.to_string());
    }

    pub fn requests(&self) -> Vec<FulfillmentRequest> {
        self.inner.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl FulfillmentNotifier for RecordingFulfillmentNotifier {
    async fn notify(&self, request: FulfillmentRequest) -> Result<(), FulfillmentError> {
        let mut state = self.inner.lock().unwrap();
        if let Some(message) = &state.failure {
            return Err(FulfillmentError::Unavailable(message.clone()));
        }
        state.requests.push(request);
        Ok(())
    }
}
