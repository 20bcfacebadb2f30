//! SubscriptionChangeCoordinator - price/quantity changes on a live subscription.
//!
//! Fetch current state, decide the strategy, then either quote the change
//! (preview) or submit it (commit). The backend prorates; a preview is split
//! locally into due-now and due-at-renewal.

use std::sync::Arc;

use crate::domain::billing::{
    plan_item_changes, split_invoice, BillingError, ChangeStrategy, Invoice, PriceCatalog,
    ProrationSplit, Subscription,
};
use crate::ports::{BillingBackend, InvoicePreviewRequest, UpdateSubscriptionRequest};

/// Command to change a subscription's price and/or quantity.
#[derive(Debug, Clone, Default)]
pub struct ChangeSubscriptionCommand {
    pub subscription_id: String,

    /// Target price lookup key. `None` keeps the current price.
    pub new_price_lookup_key: Option<String>,

    /// Target quantity. `None` keeps the current quantity.
    pub quantity: Option<u64>,

    /// Forwarded to the backend on commit.
    pub idempotency_key: Option<String>,
}

/// Whether the change is quoted or applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeMode {
    Preview,
    Commit,
}

/// Result of a change.
#[derive(Debug, Clone)]
pub struct ChangeSubscriptionResult {
    /// Committed subscription, or the unchanged one for previews and no-ops.
    pub subscription: Subscription,

    pub strategy: ChangeStrategy,

    /// Present for previews.
    pub proration: Option<ProrationSplit>,

    /// The quote the split was computed from. Present for previews.
    pub invoice: Option<Invoice>,
}

/// Coordinates subscription mutations against the billing backend.
pub struct SubscriptionChangeCoordinator {
    backend: Arc<dyn BillingBackend>,
    catalog: Arc<PriceCatalog>,
}

impl SubscriptionChangeCoordinator {
    pub fn new(backend: Arc<dyn BillingBackend>, catalog: Arc<PriceCatalog>) -> Self {
        Self { backend, catalog }
    }

    pub async fn apply_change(
        &self,
        cmd: ChangeSubscriptionCommand,
        mode: ChangeMode,
    ) -> Result<ChangeSubscriptionResult, BillingError> {
        // 1. Fetch current state
        let subscription = self
            .backend
            .get_subscription(&cmd.subscription_id)
            .await?
            .ok_or_else(|| BillingError::not_found("Subscription", &cmd.subscription_id))?;
        let current_item = subscription.primary_item().ok_or_else(|| {
            BillingError::not_found("Subscription item", format!("{} has no items", subscription.id))
        })?;

        // 2. Decide strategy
        let target_price = self
            .catalog
            .resolve_optional(cmd.new_price_lookup_key.as_deref())?;
        let strategy = plan_item_changes(current_item, target_price, cmd.quantity)?;

        tracing::info!(
            subscription_id = %subscription.id,
            strategy = strategy.name(),
            mode = ?mode,
            "Planned subscription change"
        );

        match mode {
            // 3. Preview: quote and split at the current period end
            ChangeMode::Preview => {
                let invoice = self
                    .backend
                    .preview_invoice(InvoicePreviewRequest {
                        customer_id: subscription.customer_id.clone(),
                        subscription_id: Some(subscription.id.clone()),
                        items: strategy.item_changes(),
                    })
                    .await?;

                let period_end = if strategy.is_no_change() {
                    None
                } else {
                    Some(subscription.current_period_end)
                };
                let split = split_invoice(&invoice, period_end)?;
                tracing::debug!(
                    subscription_id = %subscription.id,
                    immediate_total = split.immediate_total,
                    next_period_total = split.next_period_total,
                    total = split.total(),
                    "Change quoted"
                );

                Ok(ChangeSubscriptionResult {
                    subscription,
                    strategy,
                    proration: Some(split),
                    invoice: Some(invoice),
                })
            }

            // 4. Commit: one update call, backend result is authoritative
            ChangeMode::Commit if strategy.is_no_change() => Ok(ChangeSubscriptionResult {
                subscription,
                strategy,
                proration: None,
                invoice: None,
            }),
            ChangeMode::Commit => {
                let updated = self
                    .backend
                    .update_subscription(UpdateSubscriptionRequest {
                        subscription_id: subscription.id.clone(),
                        items: strategy.item_changes(),
                        idempotency_key: cmd.idempotency_key,
                    })
                    .await?;

                tracing::info!(
                    subscription_id = %updated.id,
                    strategy = strategy.name(),
                    "Subscription updated"
                );

                Ok(ChangeSubscriptionResult {
                    subscription: updated,
                    strategy,
                    proration: None,
                    invoice: None,
                })
            }
        }
    }
}
