//! Durable TTL cache shared across short-lived lwkit processes.
//!
//! Every invocation of the `lw` binary is a fresh process, so memoized
//! reference data has to live on disk. [`TtlCache`] stores one JSON file per
//! entry under a cache directory; a corrupted or half-written file only ever
//! costs a cache miss for that one key.
//!
//! # Keys
//!
//! [`CacheKey`] retains only `[A-Za-z0-9_.-]` from the logical key. Keys for
//! reference data are scoped to the API endpoint and a SHA-256 digest of the
//! bearer token, so two credentials never share an entry.
//!
//! # Example
//!
//! ```ignore
//! let cache = TtlCache::open(config.cache_dir)?;
//! let key = CacheKey::scoped(PayloadKind::Tags, &config.api_url, &config.api_token);
//! cache.set(&key, CachePayload::TagList(tags), 600);
//! if let Some(CachePayload::TagList(tags)) = cache.get(&key) {
//!     // served without a network call
//! }
//! ```

pub mod clock;
pub mod entry;
pub mod error;
pub mod key;
pub mod read;
pub mod stats;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use entry::{CacheEntry, CachePayload, PayloadKind};
pub use error::CacheError;
pub use key::CacheKey;
pub use read::CacheRead;
pub use stats::CacheStats;
pub use store::{CacheInfo, EntryStatus, EntrySummary, TtlCache};
