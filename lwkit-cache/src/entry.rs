//! Stored cache entries and their typed payloads.

use chrono::{DateTime, Duration, Utc};
use lwkit_core::{Collection, Tag};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Reference data kinds that may be cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadKind {
    Collections,
    Tags,
}

impl PayloadKind {
    /// Prefix used when deriving cache keys for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collections => "collections",
            Self::Tags => "tags",
        }
    }
}

/// A cached value. Only known shapes are stored, so a file written by one
/// version and read by another fails loudly at decode time instead of
/// producing a mistyped value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum CachePayload {
    CollectionList(Vec<Collection>),
    TagList(Vec<Tag>),
}

impl CachePayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::CollectionList(_) => PayloadKind::Collections,
            Self::TagList(_) => PayloadKind::Tags,
        }
    }

    /// Number of items in the list.
    pub fn item_count(&self) -> usize {
        match self {
            Self::CollectionList(items) => items.len(),
            Self::TagList(items) => items.len(),
        }
    }

    pub fn into_collections(self) -> Option<Vec<Collection>> {
        match self {
            Self::CollectionList(items) => Some(items),
            Self::TagList(_) => None,
        }
    }

    pub fn into_tags(self) -> Option<Vec<Tag>> {
        match self {
            Self::TagList(items) => Some(items),
            Self::CollectionList(_) => None,
        }
    }
}

/// On-disk representation of one cache entry.
///
/// Invariant: `expires_at > created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: CachePayload,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry living `ttl_secs` from `now`.
    pub fn new(value: CachePayload, now: DateTime<Utc>, ttl_secs: u64) -> Result<Self, CacheError> {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(Duration::try_seconds)
            .ok_or(CacheError::InvalidTtl(ttl_secs))?;
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or(CacheError::InvalidTtl(ttl_secs))?;
        Ok(Self {
            value,
            created_at: now,
            expires_at,
        })
    }

    /// An entry is expired strictly after its expiry instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.expires_at - now).to_std().unwrap_or(std::time::Duration::ZERO)
    }

    /// Time since the entry was written.
    pub fn age(&self, now: DateTime<Utc>) -> std::time::Duration {
        (now - self.created_at).to_std().unwrap_or(std::time::Duration::ZERO)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, CacheError> {
        serde_json::to_vec_pretty(self).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, CacheError> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::Deserialization(e.to_string()))
    }
}
