/// Error type for cache storage operations.
///
/// These never escape the public [`TtlCache`](crate::TtlCache) read/write
/// methods; they are logged and counted in [`CacheStats::errors`](crate::CacheStats).
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// TTL that would produce an already-expired entry.
    #[error("Invalid TTL: {0}s (must be greater than zero)")]
    InvalidTtl(u64),
}
