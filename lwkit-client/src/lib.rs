//! lwkit Client - Request Orchestration
//!
//! Everything that talks to the bookmark service:
//! - [`RemoteClient`]: authenticated HTTP transport with typed failures
//! - [`ReferenceDataCache`]: TTL-cached collection and tag listings
//! - [`SearchAggregator`]: multi-filter search as a de-duplicated union of
//!   single-filter calls
//! - [`SaveCoordinator`]: create-then-file protocol for saving links into a
//!   named collection
//!
//! Orchestration types are generic over [`BookmarkApi`](lwkit_core::BookmarkApi)
//! so they run unchanged against the in-memory mock in tests.

pub mod reference;
pub mod remote;
pub mod save;
pub mod search;

pub use reference::ReferenceDataCache;
pub use remote::{RemoteClient, USER_AGENT};
pub use save::{SaveCoordinator, SaveOutcome, SaveRequest, SaveState};
pub use search::SearchAggregator;
