//! Keyed Algorithm Cache
//!
//! [`AlgorithmsCache`] maps a [`CacheKey`] describing one configuration to the
//! value chosen for it, typically the id of the fastest algorithm. It counts
//! hits and misses so that callers can judge whether caching still pays off.
//!
//! # Lookup Protocol
//!
//! Two ways of using the cache are offered:
//!
//! - The two-step protocol: [`find`](AlgorithmsCache::find) then
//!   [`get`](AlgorithmsCache::get) on a hit, or compute and
//!   [`set`](AlgorithmsCache::set) on a miss. Each call locks separately, so
//!   another thread may clear the cache between `find` and `get`; `get`
//!   therefore returns a [`Result`] and callers must treat
//!   [`Error::KeyNotFound`] as "recompute", not as corruption.
//! - [`get_or_insert_with`](AlgorithmsCache::get_or_insert_with), which looks
//!   the key up and computes the missing value under a single lock
//!   acquisition.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                AlgorithmsCache               │
//! │  ┌────────┐                                  │
//! │  │ Mutex  │──▶ map: CacheKey ──▶ V           │
//! │  └────────┘    hits, misses                  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use autotune_cache::AlgorithmsCache;
//!
//! let cache: AlgorithmsCache<i64> = AlgorithmsCache::new();
//! let key = 42;
//!
//! let algo = if cache.find(key) {
//!     cache.get(key).unwrap()
//! } else {
//!     let best = 3; // result of benchmarking
//!     cache.set(key, best);
//!     best
//! };
//! assert_eq!(algo, 3);
//! assert_eq!(cache.misses(), 1);
//! ```

use crate::error::{Error, Result};
use crate::key::CacheKey;
use crate::metrics::{CacheMetrics, CacheStats};
use alloc::collections::BTreeMap;
use alloc::string::String;
use core::fmt;
use core::hash::BuildHasher;
use parking_lot::Mutex;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Cache from configuration keys to algorithm ids.
pub type AlgorithmsConfigKeyMap = AlgorithmsCache<i64>;

/// Entries and counters, guarded together by the cache lock.
struct CacheState<V, S> {
    map: HashMap<CacheKey, V, S>,
    hits: u64,
    misses: u64,
}

impl<V, S> CacheState<V, S> {
    fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.map.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

/// A thread-safe map from [`CacheKey`] to a cached value with hit/miss counters.
///
/// Every operation takes the cache's lock for its own duration only. Share
/// the cache via `Arc`, usually obtained from
/// [`AutoTuneCache::register_or_get`](crate::AutoTuneCache::register_or_get).
///
/// # Type Parameters
///
/// - `V`: Cached value type. Must implement `Clone` for [`get`](Self::get).
/// - `S`: Hash builder type. Defaults to `DefaultHashBuilder`.
pub struct AlgorithmsCache<V, S = DefaultHashBuilder> {
    state: Mutex<CacheState<V, S>>,
}

impl<V> AlgorithmsCache<V, DefaultHashBuilder> {
    /// Creates an empty cache with zeroed counters.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<V> Default for AlgorithmsCache<V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, S> AlgorithmsCache<V, S> {
    /// Creates an empty cache that hashes keys with `hash_builder`.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            state: Mutex::new(CacheState {
                map: HashMap::with_hasher(hash_builder),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Returns the number of cached entries.
    pub fn size(&self) -> usize {
        self.state.lock().map.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.state.lock().map.is_empty()
    }

    /// Returns the number of [`find`](Self::find) calls that found their key.
    pub fn hits(&self) -> u64 {
        self.state.lock().hits
    }

    /// Returns the number of [`find`](Self::find) calls that did not find their key.
    pub fn misses(&self) -> u64 {
        self.state.lock().misses
    }

    /// Returns `hits / (hits + misses)`, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        self.stats().hit_rate()
    }

    /// Returns `misses / (hits + misses)`, or 0.0 before the first lookup.
    pub fn miss_rate(&self) -> f64 {
        self.stats().miss_rate()
    }

    /// Returns size and counters read under one lock acquisition.
    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats()
    }

    /// Removes all entries and resets the counters.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.map.clear();
        state.hits = 0;
        state.misses = 0;
    }
}

impl<V, S: BuildHasher> AlgorithmsCache<V, S> {
    /// Reports whether `key` is cached, counting a hit or a miss.
    ///
    /// Neither allocates nor touches the entries. A `true` result does not
    /// guarantee that a following [`get`](Self::get) succeeds.
    pub fn find(&self, key: CacheKey) -> bool {
        let mut state = self.state.lock();
        if state.map.contains_key(&key) {
            state.hits += 1;
            true
        } else {
            state.misses += 1;
            false
        }
    }

    /// Returns a clone of the value cached under `key`.
    ///
    /// Does not update the counters; call [`find`](Self::find) first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if `key` is not cached.
    pub fn get(&self, key: CacheKey) -> Result<V>
    where
        V: Clone,
    {
        self.get_with(key, V::clone)
    }

    /// Applies `f` to the value cached under `key` while holding the lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if `key` is not cached.
    pub fn get_with<F, R>(&self, key: CacheKey, f: F) -> Result<R>
    where
        F: FnOnce(&V) -> R,
    {
        let state = self.state.lock();
        state.map.get(&key).map(f).ok_or(Error::KeyNotFound { key })
    }

    /// Caches `value` under `key`, replacing any previous value.
    pub fn set(&self, key: CacheKey, value: V) {
        self.state.lock().map.insert(key, value);
    }

    /// Returns the value cached under `key`, computing and caching it with
    /// `f` if absent.
    ///
    /// Lookup, computation and insertion happen under one lock acquisition,
    /// so `f` runs at most once per key even under contention. Counts a hit
    /// when the value was cached and a miss when `f` ran. `f` must not call
    /// back into this cache.
    pub fn get_or_insert_with<F>(&self, key: CacheKey, f: F) -> V
    where
        V: Clone,
        F: FnOnce() -> V,
    {
        let mut state = self.state.lock();
        if let Some(value) = state.map.get(&key) {
            let value = value.clone();
            state.hits += 1;
            return value;
        }
        state.misses += 1;
        let value = f();
        state.map.insert(key, value.clone());
        value
    }
}

impl<V, S> CacheMetrics for AlgorithmsCache<V, S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.stats().to_btreemap()
    }

    fn cache_type(&self) -> &'static str {
        "AlgorithmsCache"
    }
}

impl<V, S> fmt::Debug for AlgorithmsCache<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("AlgorithmsCache")
            .field("size", &stats.size)
            .field("hits", &stats.hits)
            .field("misses", &stats.misses)
            .finish()
    }
}
