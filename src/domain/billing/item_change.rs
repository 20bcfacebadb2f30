//! Strategy selection for a price/quantity change on one subscription item.
//!
//! Pure: given the current item and the requested target, decide which item
//! operations the backend must receive. Nothing here talks to the backend.

use serde::Serialize;

use super::errors::BillingError;
use super::subscription::SubscriptionItem;

/// One operation on a subscription's item list, keyed by item id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ItemChange {
    /// Change the quantity of an existing item in place.
    Update { id: String, quantity: u64 },

    /// Remove an existing item.
    Delete { id: String },

    /// Add a new item for a price.
    Add { price_id: String, quantity: u64 },
}

/// How a requested change will be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ChangeStrategy {
    /// Target equals current state. No backend write.
    NoChange,

    /// Same price, different quantity. The item id is preserved.
    QuantityUpdate { item_id: String, quantity: u64 },

    /// Different price. Old item is deleted and a new one added in one call.
    Replace {
        removed_item_id: String,
        price_id: String,
        quantity: u64,
    },
}

impl ChangeStrategy {
    /// Item operations to submit. Empty for `NoChange`.
    pub fn item_changes(&self) -> Vec<ItemChange> {
        match self {
            ChangeStrategy::NoChange => Vec::new(),
            ChangeStrategy::QuantityUpdate { item_id, quantity } => vec![ItemChange::Update {
                id: item_id.clone(),
                quantity: *quantity,
            }],
            ChangeStrategy::Replace {
                removed_item_id,
                price_id,
                quantity,
            } => vec![
                ItemChange::Delete {
                    id: removed_item_id.clone(),
                },
                ItemChange::Add {
                    price_id: price_id.clone(),
                    quantity: *quantity,
                },
            ],
        }
    }

    pub fn is_no_change(&self) -> bool {
        matches!(self, ChangeStrategy::NoChange)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChangeStrategy::NoChange => "no_change",
            ChangeStrategy::QuantityUpdate { .. } => "quantity_update",
            ChangeStrategy::Replace { .. } => "replace",
        }
    }
}

/// Decides how to move `current` to the target price and quantity.
///
/// `None` for either target means "keep the current value".
///
/// # Errors
///
/// - `Validation` if the target quantity is zero
pub fn plan_item_changes(
    current: &SubscriptionItem,
    target_price_id: Option<&str>,
    target_quantity: Option<u64>,
) -> Result<ChangeStrategy, BillingError> {
    if target_quantity == Some(0) {
        return Err(BillingError::validation("quantity", "must be at least 1"));
    }

    let price_id = target_price_id.unwrap_or(&current.price.id);
    let quantity = target_quantity.unwrap_or(current.quantity);

    if price_id != current.price.id {
        return Ok(ChangeStrategy::Replace {
            removed_item_id: current.id.clone(),
            price_id: price_id.to_string(),
            quantity,
        });
    }

    if quantity != current.quantity {
        return Ok(ChangeStrategy::QuantityUpdate {
            item_id: current.id.clone(),
            quantity,
        });
    }

    Ok(ChangeStrategy::NoChange)
}
