//! Catalog configuration.

use core::str::FromStr;

use wholesale_products::{
    DEFAULT_PLACEHOLDER_IMAGE_BASE, DEFAULT_PRICE_HISTORY_LIMIT, LifecyclePolicy,
};

pub const ENV_PRICE_HISTORY_LIMIT: &str = "CATALOG_PRICE_HISTORY_LIMIT";
pub const ENV_LOW_STOCK_THRESHOLD: &str = "CATALOG_LOW_STOCK_THRESHOLD";
pub const ENV_DEFAULT_MINIMUM_STOCK: &str = "CATALOG_DEFAULT_MINIMUM_STOCK";
pub const ENV_PLACEHOLDER_IMAGE_BASE: &str = "CATALOG_PLACEHOLDER_IMAGE_BASE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Price-history entries kept per product (at least 1).
    pub price_history_limit: usize,
    /// Upper bound (inclusive) used by low-stock queries and stats.
    pub low_stock_threshold: u32,
    /// `minimumStock` given to products created without one.
    pub default_minimum_stock: u32,
    /// Prefix of the grade placeholder image.
    pub placeholder_image_base: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            price_history_limit: DEFAULT_PRICE_HISTORY_LIMIT,
            low_stock_threshold: 10,
            default_minimum_stock: 5,
            placeholder_image_base: DEFAULT_PLACEHOLDER_IMAGE_BASE.to_string(),
        }
    }
}

impl CatalogConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults and
    /// unparsable ones are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let price_history_limit = parse_or(
            &lookup,
            ENV_PRICE_HISTORY_LIMIT,
            defaults.price_history_limit,
        );
        let price_history_limit = if price_history_limit == 0 {
            tracing::warn!(
                key = ENV_PRICE_HISTORY_LIMIT,
                "price history limit must be at least 1; using default"
            );
            defaults.price_history_limit
        } else {
            price_history_limit
        };

        Self {
            price_history_limit,
            low_stock_threshold: parse_or(
                &lookup,
                ENV_LOW_STOCK_THRESHOLD,
                defaults.low_stock_threshold,
            ),
            default_minimum_stock: parse_or(
                &lookup,
                ENV_DEFAULT_MINIMUM_STOCK,
                defaults.default_minimum_stock,
            ),
            placeholder_image_base: lookup(ENV_PLACEHOLDER_IMAGE_BASE)
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.placeholder_image_base),
        }
    }

    pub fn lifecycle_policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            price_history_limit: self.price_history_limit,
            default_minimum_stock: self.default_minimum_stock,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "ignoring unparsable catalog setting");
                default
            }
        },
    }
}
