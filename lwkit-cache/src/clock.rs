//! Time source for expiry decisions.

use chrono::{DateTime, Utc};

/// Source of "now" for the cache.
///
/// Production code uses [`SystemClock`]; tests substitute an advanceable
/// clock so expiry can be exercised without sleeping.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
