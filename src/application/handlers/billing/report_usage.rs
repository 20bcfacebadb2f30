//! ReportUsageHandler - records metered usage against a subscription item.
//!
//! Usually driven by a periodic job that totals usage per item. Passing an
//! idempotency key makes a re-run of the same report count once.

use std::sync::Arc;

use crate::domain::billing::{BillingError, UsageAction, UsageRecord};
use crate::ports::{BillingBackend, UsageRecordRequest};

#[derive(Debug, Clone)]
pub struct ReportUsageCommand {
    pub subscription_item_id: String,
    pub quantity: u64,
    pub timestamp: Option<i64>,

    /// `increment` (default) or `set`.
    pub action: Option<String>,

    pub idempotency_key: Option<String>,
}

pub struct ReportUsageHandler {
    backend: Arc<dyn BillingBackend>,
}

impl ReportUsageHandler {
    pub fn new(backend: Arc<dyn BillingBackend>) -> Self {
        Self { backend }
    }

    pub async fn handle(&self, cmd: ReportUsageCommand) -> Result<UsageRecord, BillingError> {
        if cmd.subscription_item_id.trim().is_empty() {
            return Err(BillingError::validation("subscriptionItemId", "must not be empty"));
        }
        if matches!(cmd.timestamp, Some(ts) if ts <= 0) {
            return Err(BillingError::validation("timestamp", "must be a positive Unix timestamp"));
        }
        let action = cmd
            .action
            .as_deref()
            .map(UsageAction::parse)
            .transpose()?
            .unwrap_or_default();

        let record = self
            .backend
            .report_usage(UsageRecordRequest {
                subscription_item_id: cmd.subscription_item_id,
                quantity: cmd.quantity,
                timestamp: cmd.timestamp,
                action,
                idempotency_key: cmd.idempotency_key,
            })
            .await?;

        tracing::info!(
            subscription_item_id = %record.subscription_item_id,
            quantity = record.quantity,
            action = action.as_str(),
            "Usage reported"
        );
        Ok(record)
    }
}
