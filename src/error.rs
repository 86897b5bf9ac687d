//! Error types for the autotune cache.

use core::fmt;

use crate::key::CacheKey;

/// Result type for cache operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced by cache lookups.
///
/// Lookups that find nothing are reported rather than answered with a default
/// value, since a wrong algorithm id would silently corrupt algorithm selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// [`AlgorithmsCache::get`](crate::AlgorithmsCache::get) was called for a
    /// key that is not in the cache.
    ///
    /// Either the caller skipped `find`, or another thread flushed the cache
    /// between `find` and `get`.
    ///
    /// **Recovery:** recompute the value and `set` it.
    KeyNotFound {
        /// The key that was looked up.
        key: CacheKey,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::KeyNotFound { key } => write!(f, "the key {key:#018x} does not exist"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
