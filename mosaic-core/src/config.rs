//! Configuration types
//!
//! Two option groups: [`CatalogCacheOptions`] drives the cache/merge policy
//! (freshness windows, debounce, stale serving), [`DataSourceOptions`]
//! bounds how much history the upstream sources are asked for.

use crate::error::{CatalogResult, ConfigError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_DEBOUNCE_DELAY_MS: u64 = 2_000;
pub const DEFAULT_MAX_MERGE_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_CACHE_VALIDITY_SECS: u64 = 300;
pub const DEFAULT_STALE_RETENTION_SECS: u64 = 3_600;

pub const DEFAULT_SALES_HISTORY_DAYS: u32 = 365;
pub const DEFAULT_PURCHASE_HISTORY_DAYS: u32 = 365;
pub const DEFAULT_CONSUMED_HISTORY_DAYS: u32 = 365;
pub const DEFAULT_MANUFACTURE_HISTORY_DAYS: u32 = 730;

/// Cache and merge policy options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCacheOptions {
    /// Scheduled-refresh vs. direct-invalidate policy. When disabled, a
    /// source refresh clears the cache synchronously instead of scheduling
    /// a background merge.
    pub enable_background_merge: bool,

    /// Coalescing window: a merge fires this long after the latest
    /// invalidation in a burst.
    pub debounce_delay: Duration,

    /// Hard ceiling on debounce deferral, measured from the first
    /// invalidation of the pending window.
    pub max_merge_interval: Duration,

    /// How long a published snapshot counts as fresh.
    pub cache_validity_period: Duration,

    /// Whether the previous-generation snapshot may be served while a
    /// merge is executing.
    pub allow_stale_data_during_merge: bool,

    /// Maximum age at which the previous-generation snapshot is still
    /// servable.
    pub stale_data_retention_period: Duration,
}

impl Default for CatalogCacheOptions {
    fn default() -> Self {
        Self {
            enable_background_merge: true,
            debounce_delay: Duration::from_millis(DEFAULT_DEBOUNCE_DELAY_MS),
            max_merge_interval: Duration::from_millis(DEFAULT_MAX_MERGE_INTERVAL_MS),
            cache_validity_period: Duration::from_secs(DEFAULT_CACHE_VALIDITY_SECS),
            allow_stale_data_during_merge: true,
            stale_data_retention_period: Duration::from_secs(DEFAULT_STALE_RETENTION_SECS),
        }
    }
}

impl CatalogCacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background_merge(mut self, enabled: bool) -> Self {
        self.enable_background_merge = enabled;
        self
    }

    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    pub fn with_max_merge_interval(mut self, interval: Duration) -> Self {
        self.max_merge_interval = interval;
        self
    }

    pub fn with_cache_validity(mut self, period: Duration) -> Self {
        self.cache_validity_period = period;
        self
    }

    pub fn with_stale_serving(mut self, allowed: bool) -> Self {
        self.allow_stale_data_during_merge = allowed;
        self
    }

    pub fn with_stale_retention(mut self, period: Duration) -> Self {
        self.stale_data_retention_period = period;
        self
    }

    /// Create options from environment variables.
    ///
    /// # Environment Variables
    /// - `MOSAIC_ENABLE_BACKGROUND_MERGE`: scheduled-refresh policy (default: true)
    /// - `MOSAIC_DEBOUNCE_DELAY_MS`: coalescing window in milliseconds (default: 2000)
    /// - `MOSAIC_MAX_MERGE_INTERVAL_MS`: debounce deferral ceiling in milliseconds (default: 30000)
    /// - `MOSAIC_CACHE_VALIDITY_SECS`: freshness window in seconds (default: 300)
    /// - `MOSAIC_ALLOW_STALE_DATA_DURING_MERGE`: stale-serving branch (default: true)
    /// - `MOSAIC_STALE_RETENTION_SECS`: max servable stale age in seconds (default: 3600)
    pub fn from_env() -> Self {
        let enable_background_merge = std::env::var("MOSAIC_ENABLE_BACKGROUND_MERGE")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        let debounce_delay = Duration::from_millis(
            std::env::var("MOSAIC_DEBOUNCE_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DEBOUNCE_DELAY_MS),
        );

        let max_merge_interval = Duration::from_millis(
            std::env::var("MOSAIC_MAX_MERGE_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_MERGE_INTERVAL_MS),
        );

        let cache_validity_period = Duration::from_secs(
            std::env::var("MOSAIC_CACHE_VALIDITY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CACHE_VALIDITY_SECS),
        );

        let allow_stale_data_during_merge = std::env::var("MOSAIC_ALLOW_STALE_DATA_DURING_MERGE")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        let stale_data_retention_period = Duration::from_secs(
            std::env::var("MOSAIC_STALE_RETENTION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_STALE_RETENTION_SECS),
        );

        Self {
            enable_background_merge,
            debounce_delay,
            max_merge_interval,
            cache_validity_period,
            allow_stale_data_during_merge,
            stale_data_retention_period,
        }
    }

    /// Validate the options.
    ///
    /// Validates:
    /// - `max_merge_interval >= debounce_delay` (a ceiling below the delay
    ///   could never be honored)
    /// - `cache_validity_period > 0`
    pub fn validate(&self) -> CatalogResult<()> {
        if self.max_merge_interval < self.debounce_delay {
            return Err(ConfigError::IncompatibleOptions {
                option_a: "debounce_delay".to_string(),
                option_b: "max_merge_interval".to_string(),
            }
            .into());
        }

        if self.cache_validity_period.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "cache_validity_period".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// History windows the upstream sources are queried with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceOptions {
    /// Days of sales history to pull.
    pub sales_history_days: u32,
    /// Days of purchase history to pull.
    pub purchase_history_days: u32,
    /// Days of consumed-material history to pull.
    pub consumed_history_days: u32,
    /// Days of manufacture cost history to pull.
    pub manufacture_history_days: u32,
}

impl Default for DataSourceOptions {
    fn default() -> Self {
        Self {
            sales_history_days: DEFAULT_SALES_HISTORY_DAYS,
            purchase_history_days: DEFAULT_PURCHASE_HISTORY_DAYS,
            consumed_history_days: DEFAULT_CONSUMED_HISTORY_DAYS,
            manufacture_history_days: DEFAULT_MANUFACTURE_HISTORY_DAYS,
        }
    }
}

impl DataSourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sales_history_days(mut self, days: u32) -> Self {
        self.sales_history_days = days;
        self
    }

    pub fn with_purchase_history_days(mut self, days: u32) -> Self {
        self.purchase_history_days = days;
        self
    }

    pub fn with_consumed_history_days(mut self, days: u32) -> Self {
        self.consumed_history_days = days;
        self
    }

    pub fn with_manufacture_history_days(mut self, days: u32) -> Self {
        self.manufacture_history_days = days;
        self
    }

    /// Create options from environment variables.
    ///
    /// # Environment Variables
    /// - `MOSAIC_SALES_HISTORY_DAYS` (default: 365)
    /// - `MOSAIC_PURCHASE_HISTORY_DAYS` (default: 365)
    /// - `MOSAIC_CONSUMED_HISTORY_DAYS` (default: 365)
    /// - `MOSAIC_MANUFACTURE_HISTORY_DAYS` (default: 730)
    pub fn from_env() -> Self {
        fn days(var: &str, default: u32) -> u32 {
            std::env::var(var)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        }

        Self {
            sales_history_days: days("MOSAIC_SALES_HISTORY_DAYS", DEFAULT_SALES_HISTORY_DAYS),
            purchase_history_days: days(
                "MOSAIC_PURCHASE_HISTORY_DAYS",
                DEFAULT_PURCHASE_HISTORY_DAYS,
            ),
            consumed_history_days: days(
                "MOSAIC_CONSUMED_HISTORY_DAYS",
                DEFAULT_CONSUMED_HISTORY_DAYS,
            ),
            manufacture_history_days: days(
                "MOSAIC_MANUFACTURE_HISTORY_DAYS",
                DEFAULT_MANUFACTURE_HISTORY_DAYS,
            ),
        }
    }

    /// Validate the options. Every history window must be positive.
    pub fn validate(&self) -> CatalogResult<()> {
        let fields = [
            ("sales_history_days", self.sales_history_days),
            ("purchase_history_days", self.purchase_history_days),
            ("consumed_history_days", self.consumed_history_days),
            ("manufacture_history_days", self.manufacture_history_days),
        ];

        for (field, value) in fields {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: "0".to_string(),
                    reason: "history window must be at least one day".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_options_defaults() {
        let options = CatalogCacheOptions::default();
        assert!(options.enable_background_merge);
        assert_eq!(options.debounce_delay, Duration::from_millis(2_000));
        assert_eq!(options.max_merge_interval, Duration::from_millis(30_000));
        assert_eq!(options.cache_validity_period, Duration::from_secs(300));
        assert!(options.allow_stale_data_during_merge);
        assert_eq!(
            options.stale_data_retention_period,
            Duration::from_secs(3_600)
        );
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_cache_options_builder() {
        let options = CatalogCacheOptions::new()
            .with_background_merge(false)
            .with_debounce_delay(Duration::from_millis(50))
            .with_max_merge_interval(Duration::from_secs(5))
            .with_cache_validity(Duration::from_secs(60))
            .with_stale_serving(false)
            .with_stale_retention(Duration::from_secs(120));

        assert!(!options.enable_background_merge);
        assert_eq!(options.debounce_delay, Duration::from_millis(50));
        assert_eq!(options.max_merge_interval, Duration::from_secs(5));
        assert_eq!(options.cache_validity_period, Duration::from_secs(60));
        assert!(!options.allow_stale_data_during_merge);
        assert_eq!(options.stale_data_retention_period, Duration::from_secs(120));
    }

    #[test]
    fn test_cache_options_reject_ceiling_below_delay() {
        let options = CatalogCacheOptions::new()
            .with_debounce_delay(Duration::from_secs(10))
            .with_max_merge_interval(Duration::from_secs(5));
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_cache_options_reject_zero_validity() {
        let options = CatalogCacheOptions::new().with_cache_validity(Duration::ZERO);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_source_options_defaults_validate() {
        let options = DataSourceOptions::default();
        assert_eq!(options.sales_history_days, 365);
        assert_eq!(options.manufacture_history_days, 730);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_source_options_reject_zero_window() {
        let options = DataSourceOptions::new().with_sales_history_days(0);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_options_from_env_defaults() {
        // Without environment variables set, should use defaults
        let cache = CatalogCacheOptions::from_env();
        assert_eq!(cache, CatalogCacheOptions::default());

        let sources = DataSourceOptions::from_env();
        assert_eq!(sources, DataSourceOptions::default());
    }
}
