//! Cache Metrics
//!
//! Hit/miss statistics shared by [`AlgorithmsCache`](crate::AlgorithmsCache)
//! and the [`AutoTuneCache`](crate::AutoTuneCache) registry, and the
//! [`CacheMetrics`] trait used to report them.
//!
//! Reports are `BTreeMap`s so that keys always come out in the same order,
//! which keeps periodic diagnostic output comparable between steps.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::ops::AddAssign;

/// Point-in-time size and access counters of a cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached entries.
    pub size: usize,

    /// Number of lookups that found their key.
    pub hits: u64,

    /// Number of lookups that did not find their key.
    pub misses: u64,
}

impl CacheStats {
    /// Total number of lookups.
    #[inline]
    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Returns `hits / (hits + misses)`, or 0.0 if there were no lookups.
    pub fn hit_rate(&self) -> f64 {
        let accesses = self.accesses();
        if accesses > 0 {
            self.hits as f64 / accesses as f64
        } else {
            0.0
        }
    }

    /// Returns `misses / (hits + misses)`, or 0.0 if there were no lookups.
    pub fn miss_rate(&self) -> f64 {
        let accesses = self.accesses();
        if accesses > 0 {
            self.misses as f64 / accesses as f64
        } else {
            0.0
        }
    }

    /// Converts the stats to a BTreeMap for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("cache_hits".to_string(), self.hits as f64);
        metrics.insert("cache_misses".to_string(), self.misses as f64);
        metrics.insert("requests".to_string(), self.accesses() as f64);
        metrics.insert("size".to_string(), self.size as f64);

        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());

        metrics
    }
}

impl AddAssign for CacheStats {
    fn add_assign(&mut self, other: Self) {
        self.size += other.size;
        self.hits += other.hits;
        self.misses += other.misses;
    }
}

/// Uniform metrics reporting for caches and registries.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Name of the reporting component, e.g. `"AlgorithmsCache"`.
    fn cache_type(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_without_accesses() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.miss_rate(), 0.0);
        assert_eq!(stats.accesses(), 0);
    }

    #[test]
    fn test_rates() {
        let stats = CacheStats {
            size: 2,
            hits: 3,
            misses: 1,
        };
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(stats.miss_rate(), 0.25);
    }

    #[test]
    fn test_add_assign() {
        let mut total = CacheStats {
            size: 1,
            hits: 2,
            misses: 3,
        };
        total += CacheStats {
            size: 4,
            hits: 5,
            misses: 6,
        };
        assert_eq!(
            total,
            CacheStats {
                size: 5,
                hits: 7,
                misses: 9
            }
        );
    }

    #[test]
    fn test_btreemap_keys() {
        let stats = CacheStats {
            size: 1,
            hits: 1,
            misses: 1,
        };
        let metrics = stats.to_btreemap();
        let keys: alloc::vec::Vec<&str> = metrics.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["cache_hits", "cache_misses", "hit_rate", "miss_rate", "requests", "size"]
        );
        assert_eq!(metrics["hit_rate"], 0.5);
    }
}
