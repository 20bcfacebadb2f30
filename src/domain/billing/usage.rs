//! Metered usage reported against a subscription item.

use serde::{Deserialize, Serialize};

use super::errors::BillingError;

/// How a reported quantity combines with usage already recorded for the same
/// timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageAction {
    /// Add to the recorded quantity.
    #[default]
    Increment,

    /// Replace the recorded quantity.
    Set,
}

impl UsageAction {
    pub fn parse(action: &str) -> Result<Self, BillingError> {
        match action.trim().to_ascii_lowercase().as_str() {
            "increment" => Ok(UsageAction::Increment),
            "set" => Ok(UsageAction::Set),
            other => Err(BillingError::validation(
                "action",
                format!("expected 'increment' or 'set', got '{}'", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UsageAction::Increment => "increment",
            UsageAction::Set => "set",
        }
    }
}

/// Usage the backend recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: String,
    pub subscription_item_id: String,
    pub quantity: u64,

    /// Unix timestamp the usage is attributed to.
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_either_case() {
        assert_eq!(UsageAction::parse("set").unwrap(), UsageAction::Set);
        assert_eq!(UsageAction::parse(" Increment ").unwrap(), UsageAction::Increment);
    }

    #[test]
    fn parse_rejects_other_actions() {
        let err = UsageAction::parse("decrement").unwrap_err();
        assert!(matches!(err, BillingError::Validation { field: "action", .. }));
    }

    #[test]
    fn default_is_increment() {
        assert_eq!(UsageAction::default().as_str(), "increment");
    }
}
