use serde::{Deserialize, Serialize};

/// Statistics about cache usage in this process.
///
/// Counters only ever increase (until [`TtlCache::reset_stats`](crate::TtlCache::reset_stats))
/// and are not persisted: each invocation starts from zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses, including expired and unreadable entries.
    pub misses: u64,
    /// Number of successful writes.
    pub sets: u64,
    /// Number of entries removed because they expired or were unreadable.
    pub expired: u64,
    /// Number of I/O or decode failures absorbed by the cache.
    pub errors: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert_eq!(stats.total_requests(), 4);
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
