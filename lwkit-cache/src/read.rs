//! Cache read results carrying freshness metadata.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// A value served either from the cache or from the remote source.
///
/// Callers that only want the data use [`CacheRead::into_value`]; the
/// metadata lets commands report whether a network call was needed.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRead<T> {
    value: T,
    /// When this value was cached (or fetched from the source).
    cached_at: DateTime<Utc>,
    /// Expiry of the backing entry, if it came from the cache.
    expires_at: Option<DateTime<Utc>>,
    was_cache_hit: bool,
}

impl<T> CacheRead<T> {
    /// Create a new cache read from a cache hit.
    pub fn from_cache(value: T, cached_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value,
            cached_at,
            expires_at: Some(expires_at),
            was_cache_hit: true,
        }
    }

    /// Create a new cache read from a remote fetch (cache miss).
    pub fn from_source(value: T, fetched_at: DateTime<Utc>) -> Self {
        Self {
            value,
            cached_at: fetched_at,
            expires_at: None,
            was_cache_hit: false,
        }
    }

    /// Consume the wrapper and return the underlying value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Get a reference to the underlying value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// How old the data is relative to `now`.
    pub fn staleness(&self, now: DateTime<Utc>) -> Duration {
        (now - self.cached_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Check if this was a cache hit.
    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }
}
