//! lwkit Core - Bookmark Types
//!
//! Data structures shared by every lwkit crate: remote entities, search
//! filter expansion, the remote API seam, configuration, and the error
//! taxonomy. Orchestration lives in lwkit-client; persistence in lwkit-cache.

pub mod api;
pub mod config;
pub mod entities;
pub mod error;
pub mod filter;
pub mod identity;

pub use api::{ApiEnvelope, BookmarkApi};
pub use config::{
    cache_dir_from_lookup, default_cache_dir, CacheTtls, ClientConfig, TtlCategory,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SEARCH_LIMIT, MAX_TTL_SECS, MIN_TTL_SECS,
};
pub use entities::{
    Collection, CollectionCount, CollectionRef, Link, LinkUpdate, NewCollection, NewLink, Tag,
};
pub use error::{ApiError, ApiResult, ConfigError};
pub use filter::{FilterCombination, SearchFilterSet, SearchParams, SearchSort};
pub use identity::{CollectionId, LinkId, OwnerId, TagId};
