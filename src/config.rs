//! Cache Registry Configuration
//!
//! [`AutoTuneCacheConfig`] controls the invalidation policy of the
//! [`AutoTuneCache`](crate::AutoTuneCache) registry.
//!
//! # Clean Threshold
//!
//! Under workloads with highly variable input shapes, every new shape adds
//! an entry that is unlikely to be looked up again, and the family maps grow
//! without bound. [`AutoTuneCache::clean`](crate::AutoTuneCache::clean) flushes
//! every family once the observed miss rate exceeds `clean_threshold`. The
//! default of `0.01` tolerates one miss per hundred lookups.
//!
//! A threshold of `1.0` or more disables flushing, as no miss rate exceeds it.
//!
//! # Examples
//!
//! ```
//! use autotune_cache::config::AutoTuneCacheConfig;
//! use autotune_cache::AutoTuneCache;
//!
//! let config = AutoTuneCacheConfig::new().with_clean_threshold(0.05);
//! let registry: AutoTuneCache<i64> = AutoTuneCache::with_config(config);
//! assert_eq!(registry.config().clean_threshold(), 0.05);
//! ```

use core::fmt;

/// Miss rate above which the registry discards every family.
pub const DEFAULT_CLEAN_THRESHOLD: f64 = 0.01;

/// Configuration for an [`AutoTuneCache`](crate::AutoTuneCache) registry.
#[derive(Clone, Copy, PartialEq)]
pub struct AutoTuneCacheConfig {
    clean_threshold: f64,
}

impl AutoTuneCacheConfig {
    /// Creates a configuration with the default clean threshold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clean_threshold: DEFAULT_CLEAN_THRESHOLD,
        }
    }

    /// Sets the miss rate above which `clean` flushes all families.
    ///
    /// # Panics
    ///
    /// Panics if `threshold` is NaN or negative.
    #[must_use]
    pub fn with_clean_threshold(mut self, threshold: f64) -> Self {
        assert!(
            !threshold.is_nan() && threshold >= 0.0,
            "clean threshold must be a non-negative number"
        );
        self.clean_threshold = threshold;
        self
    }

    /// Returns the miss rate above which `clean` flushes all families.
    #[inline]
    pub fn clean_threshold(&self) -> f64 {
        self.clean_threshold
    }
}

impl Default for AutoTuneCacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AutoTuneCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoTuneCacheConfig")
            .field("clean_threshold", &self.clean_threshold)
            .finish()
    }
}
