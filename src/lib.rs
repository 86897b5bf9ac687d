#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Components
//!
//! | Type | Role |
//! |------|------|
//! | [`compose_key!`] / [`key::conv_key`] | Fold configuration attributes into a [`CacheKey`] |
//! | [`AlgorithmsCache`] | One locked map from key to chosen value, with hit/miss counters |
//! | [`AutoTuneCache`] | Registry of one cache per algorithm family, aggregate stats, flush policy |
//!
//! ```text
//! ┌───────────────┐    ┌─────────────────────────┐    ┌──────────────────┐
//! │ compose_key!  │──▶ │ AutoTuneCache           │──▶ │ AlgorithmsCache  │
//! │ (attributes)  │    │ register_or_get(family) │    │ find / get / set │
//! └───────────────┘    └─────────────────────────┘    └──────────────────┘
//!                                  │
//!                                  ▼
//!                       update_status() / clean(miss_rate)
//! ```
//!
//! ## Modules
//!
//! - [`key`]: Composite key derivation
//! - [`cache`]: The per-family keyed cache
//! - [`registry`]: The family registry and its flush policy
//! - [`config`]: Registry configuration
//! - [`metrics`]: Statistics snapshots and reporting
//! - [`error`]: Error types

#![no_std]

extern crate alloc;

#[cfg(any(feature = "std", not(feature = "hashbrown"), test))]
extern crate std;

#[cfg(test)]
extern crate scoped_threadpool;

/// Composite key derivation.
///
/// Provides the [`KeyHash`](key::KeyHash) trait, the combining step
/// [`hash_combine`](key::hash_combine), the [`compose_key!`] macro and
/// domain key builders such as [`conv_key`](key::conv_key).
pub mod key;

/// Keyed algorithm cache.
///
/// A single thread-safe map from [`CacheKey`] to a cached value with
/// hit/miss accounting.
pub mod cache;

/// Algorithm family registry.
///
/// Owns one [`AlgorithmsCache`] per family name and flushes them all when
/// the miss rate degrades.
pub mod registry;

/// Registry configuration.
pub mod config;

/// Cache statistics and the metrics reporting trait.
pub mod metrics;

/// Error types.
pub mod error;

pub use cache::{AlgorithmsCache, AlgorithmsConfigKeyMap};
pub use config::AutoTuneCacheConfig;
pub use error::{Error, Result};
pub use key::{CacheKey, DataType, KeyHash};
pub use metrics::{CacheMetrics, CacheStats};
pub use registry::AutoTuneCache;
