//! Algorithm Family Registry
//!
//! [`AutoTuneCache`] owns one [`AlgorithmsCache`] per algorithm family (for
//! example `"conv_forward"` or `"matmul"`), aggregates their statistics and
//! flushes all of them when the observed miss rate degrades.
//!
//! The registry is an ordinary value: create it once at startup and share it
//! with `Arc`. Separate registries never share families, which keeps tests
//! independent of each other.
//!
//! # Locking
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         AutoTuneCache                            │
//! │  ┌────────┐                                                      │
//! │  │ Mutex  │──▶ families: name ──▶ Arc<AlgorithmsCache>           │
//! │  └────────┘                        │                             │
//! │                      ┌─────────────┼─────────────┐               │
//! │                      ▼             ▼             ▼               │
//! │               ┌────────────┐ ┌────────────┐ ┌────────────┐       │
//! │               │ conv Mutex │ │ pool Mutex │ │ gemm Mutex │       │
//! │               └────────────┘ └────────────┘ └────────────┘       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The registry lock only covers the family map. It is never held while a
//! family cache is locked, so the two lock levels cannot deadlock.
//!
//! # Invalidation
//!
//! [`clean`](AutoTuneCache::clean) discards every family at once; there is no
//! per-family or per-entry eviction. Handles obtained before a flush remain
//! valid to use but are detached: they are no longer reachable through the
//! registry and no longer counted by [`update_status`](AutoTuneCache::update_status).
//! Call [`register_or_get`](AutoTuneCache::register_or_get) again after a
//! flush rather than holding handles across steps.
//!
//! # Example
//!
//! ```rust
//! use autotune_cache::AutoTuneCache;
//! use std::sync::Arc;
//!
//! let registry: Arc<AutoTuneCache> = Arc::new(AutoTuneCache::new());
//!
//! let conv = registry.register_or_get("conv");
//! if !conv.find(7) {
//!     conv.set(7, 2);
//! }
//!
//! // Once per step: refresh statistics and flush if lookups keep missing.
//! registry.update_status();
//! assert_eq!(registry.size(), 1);
//! assert_eq!(registry.misses(), 1);
//! registry.clean(registry.miss_rate());
//! assert_eq!(registry.family_count(), 0);
//! ```

use crate::cache::AlgorithmsCache;
use crate::config::AutoTuneCacheConfig;
use crate::metrics::{CacheMetrics, CacheStats};
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::mem;
use log::{debug, info, trace};
use parking_lot::Mutex;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Registry of per-family [`AlgorithmsCache`]s with aggregate statistics.
///
/// # Type Parameters
///
/// - `V`: Value type cached by every family. Defaults to `i64` algorithm ids.
pub struct AutoTuneCache<V = i64> {
    families: Mutex<HashMap<String, Arc<AlgorithmsCache<V>>>>,
    status: Mutex<CacheStats>,
    config: AutoTuneCacheConfig,
}

impl<V> AutoTuneCache<V> {
    /// Creates an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(AutoTuneCacheConfig::default())
    }

    /// Creates an empty registry with the given configuration.
    pub fn with_config(config: AutoTuneCacheConfig) -> Self {
        Self {
            families: Mutex::new(HashMap::new()),
            status: Mutex::new(CacheStats::default()),
            config,
        }
    }

    /// Returns the registry configuration.
    pub fn config(&self) -> &AutoTuneCacheConfig {
        &self.config
    }

    /// Returns the cache of `family`, creating an empty one on first use.
    ///
    /// Lookup and creation happen under the registry lock, so concurrent first
    /// calls for the same family all receive the same cache.
    pub fn register_or_get(&self, family: &str) -> Arc<AlgorithmsCache<V>> {
        let mut families = self.families.lock();
        if let Some(cache) = families.get(family) {
            return Arc::clone(cache);
        }

        trace!("registering algorithm family {}", family);
        let cache = Arc::new(AlgorithmsCache::new());
        families.insert(family.to_string(), Arc::clone(&cache));
        cache
    }

    /// Discards every family if `observed_miss_rate` exceeds the configured
    /// clean threshold.
    ///
    /// Returns `true` if the families were discarded. A NaN miss rate never
    /// triggers a flush. The aggregate statistics keep their last values until
    /// the next [`update_status`](Self::update_status).
    pub fn clean(&self, observed_miss_rate: f64) -> bool {
        let threshold = self.config.clean_threshold();
        if observed_miss_rate.is_nan() || observed_miss_rate <= threshold {
            return false;
        }

        let discarded = mem::take(&mut *self.families.lock());
        info!(
            "miss rate {:.4} exceeds {:.4}, discarding {} algorithm families",
            observed_miss_rate,
            threshold,
            discarded.len()
        );
        // Family caches are dropped here, outside the registry lock.
        drop(discarded);
        true
    }

    /// Recomputes the aggregate size, hits and misses over all families.
    ///
    /// The result is kept as a snapshot for [`size`](Self::size),
    /// [`hits`](Self::hits), [`misses`](Self::misses) and the rate accessors.
    /// Intended to be called periodically, not on every lookup.
    pub fn update_status(&self) -> CacheStats {
        let mut families: Vec<(String, Arc<AlgorithmsCache<V>>)> = self
            .families
            .lock()
            .iter()
            .map(|(name, cache)| (name.clone(), Arc::clone(cache)))
            .collect();
        families.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut total = CacheStats::default();
        for (name, cache) in &families {
            let stats = cache.stats();
            debug!(
                "algo type: {} cache size: {} hits: {} misses: {} hit rate: {:.4}",
                name,
                stats.size,
                stats.hits,
                stats.misses,
                stats.hit_rate()
            );
            total += stats;
        }

        debug!(
            "autotune cache size: {} hits: {} misses: {} hit rate: {:.4}",
            total.size,
            total.hits,
            total.misses,
            total.hit_rate()
        );
        *self.status.lock() = total;
        total
    }

    /// Returns the statistics captured by the last [`update_status`](Self::update_status).
    pub fn status(&self) -> CacheStats {
        *self.status.lock()
    }

    /// Total number of cached entries as of the last status update.
    pub fn size(&self) -> usize {
        self.status().size
    }

    /// Total number of hits as of the last status update.
    pub fn hits(&self) -> u64 {
        self.status().hits
    }

    /// Total number of misses as of the last status update.
    pub fn misses(&self) -> u64 {
        self.status().misses
    }

    /// Aggregate hit rate as of the last status update, 0.0 without lookups.
    pub fn hit_rate(&self) -> f64 {
        self.status().hit_rate()
    }

    /// Aggregate miss rate as of the last status update, 0.0 without lookups.
    pub fn miss_rate(&self) -> f64 {
        self.status().miss_rate()
    }

    /// Returns the number of live families.
    pub fn family_count(&self) -> usize {
        self.families.lock().len()
    }

    /// Returns the names of the live families in sorted order.
    pub fn families(&self) -> Vec<String> {
        let mut names: Vec<String> = self.families.lock().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl<V> Default for AutoTuneCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheMetrics for AutoTuneCache<V> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.status().to_btreemap();
        metrics.insert("families".to_string(), self.family_count() as f64);
        metrics
    }

    fn cache_type(&self) -> &'static str {
        "AutoTuneCache"
    }
}

impl<V> fmt::Debug for AutoTuneCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoTuneCache")
            .field("families", &self.family_count())
            .field("status", &self.status())
            .field("config", &self.config)
            .finish()
    }
}
