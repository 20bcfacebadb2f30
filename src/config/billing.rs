//! Billing configuration (Stripe keys, price catalog, webhook settings)

use std::collections::HashMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::adapters::stripe::{StripeConfig, DEFAULT_API_BASE_URL};
use crate::domain::billing::PriceCatalog;
use crate::domain::webhook::{WebhookVerifier, DEFAULT_TOLERANCE_SECS};

use super::error::ValidationError;

/// Billing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Stripe secret API key
    pub stripe_secret_key: SecretString,

    /// Stripe publishable key, handed to the browser
    pub stripe_publishable_key: String,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: SecretString,

    /// Previous signing secret, accepted during rotation
    #[serde(default)]
    pub stripe_webhook_secondary_secret: Option<SecretString>,

    /// Accepted clock skew for signed webhook timestamps
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: u64,

    /// Stripe API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Upper bound for each Stripe request
    #[serde(default = "default_backend_timeout")]
    pub backend_timeout_secs: u64,

    /// Price lookup key -> Stripe price id
    #[serde(default)]
    pub prices: HashMap<String, String>,

    /// Checkout line item name that triggers fulfillment
    #[serde(default = "default_fulfillment_add_on")]
    pub fulfillment_add_on: String,
}

impl BillingConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_secret_key.expose_secret().starts_with("sk_test_")
    }

    /// Stripe adapter settings
    pub fn stripe_config(&self) -> StripeConfig {
        StripeConfig::new(self.stripe_secret_key.clone())
            .with_base_url(self.api_base_url.clone())
            .with_timeout(Duration::from_secs(self.backend_timeout_secs))
    }

    /// Price catalog built from `prices`
    pub fn price_catalog(&self) -> PriceCatalog {
        PriceCatalog::new(self.prices.clone())
    }

    /// Webhook verifier holding the primary and, if set, secondary secret
    pub fn webhook_verifier(&self) -> WebhookVerifier {
        let verifier = WebhookVerifier::new(self.stripe_webhook_secret.clone())
            .with_tolerance(self.webhook_tolerance_secs);

        match &self.stripe_webhook_secondary_secret {
            Some(secondary) => verifier.with_secret(secondary.clone()),
            None => verifier,
        }
    }

    /// Validate billing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let secret_key = self.stripe_secret_key.expose_secret();
        if secret_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_SECRET_KEY"));
        }
        if !secret_key.starts_with("sk_") && !secret_key.starts_with("rk_") {
            return Err(ValidationError::InvalidStripeKey);
        }

        if self.stripe_publishable_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_PUBLISHABLE_KEY"));
        }
        if !self.stripe_publishable_key.starts_with("pk_") {
            return Err(ValidationError::InvalidPublishableKey);
        }

        let webhook_secrets = std::iter::once(&self.stripe_webhook_secret)
            .chain(self.stripe_webhook_secondary_secret.as_ref());
        for secret in webhook_secrets {
            let secret = secret.expose_secret();
            if secret.is_empty() {
                return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
            }
            if !secret.starts_with("whsec_") {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
        }

        if self.webhook_tolerance_secs == 0 || self.webhook_tolerance_secs > 3600 {
            return Err(ValidationError::InvalidWebhookTolerance);
        }
        if self.backend_timeout_secs == 0 || self.backend_timeout_secs > 120 {
            return Err(ValidationError::InvalidBackendTimeout);
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidApiBaseUrl);
        }

        if self.prices.is_empty() {
            return Err(ValidationError::NoPricesConfigured);
        }
        if let Some((key, _)) = self.prices.iter().find(|(_, id)| id.trim().is_empty()) {
            return Err(ValidationError::EmptyPriceId(key.clone()));
        }

        Ok(())
    }
}

fn default_webhook_tolerance() -> u64 {
    DEFAULT_TOLERANCE_SECS
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_backend_timeout() -> u64 {
    10
}

fn default_fulfillment_add_on() -> String {
    "Pasha e-book".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> BillingConfig {
        BillingConfig {
            stripe_secret_key: SecretString::new("sk_test_abcd1234".to_string()),
            stripe_publishable_key: "pk_test_abcd1234".to_string(),
            stripe_webhook_secret: SecretString::new("whsec_xyz789".to_string()),
            stripe_webhook_secondary_secret: None,
            webhook_tolerance_secs: default_webhook_tolerance(),
            api_base_url: default_api_base_url(),
            backend_timeout_secs: default_backend_timeout(),
            prices: HashMap::from([("basic".to_string(), "price_basic".to_string())]),
            fulfillment_add_on: default_fulfillment_add_on(),
        }
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid_config().validate().is_ok());
        assert!(valid_config().is_test_mode());
    }

    #[test]
    fn test_validation_invalid_secret_key_prefix() {
        let config = BillingConfig {
            stripe_secret_key: SecretString::new("pk_test_xxx".to_string()),
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStripeKey));
    }

    #[test]
    fn test_validation_missing_secret_key() {
        let config = BillingConfig {
            stripe_secret_key: SecretString::new(String::new()),
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("STRIPE_SECRET_KEY"))
        );
    }

    #[test]
    fn test_validation_invalid_publishable_key() {
        let config = BillingConfig {
            stripe_publishable_key: "sk_test_oops".to_string(),
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPublishableKey));
    }

    #[test]
    fn test_validation_invalid_secondary_webhook_secret() {
        let config = BillingConfig {
            stripe_webhook_secondary_secret: Some(SecretString::new("secret_xxx".to_string())),
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidStripeWebhookSecret)
        );
    }

    #[test]
    fn test_validation_tolerance_bounds() {
        let config = BillingConfig {
            webhook_tolerance_secs: 0,
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidWebhookTolerance));
    }

    #[test]
    fn test_validation_requires_prices() {
        let config = BillingConfig {
            prices: HashMap::new(),
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::NoPricesConfigured));
    }

    #[test]
    fn test_validation_rejects_empty_price_id() {
        let config = BillingConfig {
            prices: HashMap::from([("premium".to_string(), " ".to_string())]),
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::EmptyPriceId("premium".to_string()))
        );
    }

    #[test]
    fn test_price_catalog_from_prices() {
        let catalog = valid_config().price_catalog();
        assert_eq!(catalog.resolve("BASIC").unwrap(), "price_basic");
    }

    #[test]
    fn test_webhook_verifier_uses_configured_tolerance() {
        let config = BillingConfig {
            webhook_tolerance_secs: 60,
            ..valid_config()
        };
        assert_eq!(config.webhook_verifier().tolerance_secs(), 60);
    }

    #[test]
    fn test_debug_does_not_leak_secrets() {
        let output = format!("{:?}", valid_config());
        assert!(!output.contains("sk_test_abcd1234"));
        assert!(!output.contains("whsec_xyz789"));
    }
}
