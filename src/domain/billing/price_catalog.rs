//! Translation from storefront lookup keys to backend price ids.

use std::collections::HashMap;

use super::errors::BillingError;

/// Lookup key → price id map, injected into the coordinator.
///
/// Keys are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceCatalog {
    prices: HashMap<String, String>,
}

impl PriceCatalog {
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let prices = entries
            .into_iter()
            .map(|(key, price_id)| (key.into().to_ascii_lowercase(), price_id.into()))
            .collect();
        Self { prices }
    }

    /// Resolves a lookup key to its price id.
    ///
    /// # Errors
    ///
    /// - `Validation` if the key is blank or not in the catalog
    pub fn resolve(&self, lookup_key: &str) -> Result<&str, BillingError> {
        let key = lookup_key.trim();
        if key.is_empty() {
            return Err(BillingError::validation("price lookup key", "must not be empty"));
        }
        self.prices
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
            .ok_or_else(|| BillingError::validation("price lookup key", format!("unknown price '{}'", key)))
    }

    /// Resolves an optional lookup key. `None` passes through.
    pub fn resolve_optional(&self, lookup_key: Option<&str>) -> Result<Option<&str>, BillingError> {
        lookup_key.map(|key| self.resolve(key)).transpose()
    }

    /// Configured lookup keys, sorted.
    pub fn lookup_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.prices.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PriceCatalog {
        PriceCatalog::new([("basic", "price_basic"), ("Premium", "price_premium")])
    }

    #[test]
    fn resolves_known_key() {
        assert_eq!(catalog().resolve("basic").unwrap(), "price_basic");
    }

    #[test]
    fn resolution_ignores_case_and_whitespace() {
        assert_eq!(catalog().resolve(" PREMIUM ").unwrap(), "price_premium");
    }

    #[test]
    fn unknown_key_is_validation_error() {
        let err = catalog().resolve("enterprise").unwrap_err();
        assert!(matches!(err, BillingError::Validation { .. }));
        assert!(err.to_string().contains("enterprise"));
    }

    #[test]
    fn blank_key_is_validation_error() {
        assert!(catalog().resolve("  ").is_err());
    }

    #[test]
    fn optional_none_passes_through() {
        assert_eq!(catalog().resolve_optional(None).unwrap(), None);
        assert_eq!(
            catalog().resolve_optional(Some("basic")).unwrap(),
            Some("price_basic")
        );
    }

    #[test]
    fn lookup_keys_are_sorted() {
        assert_eq!(catalog().lookup_keys(), vec!["basic", "premium"]);
    }
}
