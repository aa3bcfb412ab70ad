//! lwkit Test Utilities
//!
//! Centralized test infrastructure for the lwkit workspace:
//! - A scripted in-memory `BookmarkApi` with call recording
//! - An advanceable clock for TTL tests
//! - Proptest generators for entity and cache types
//! - Test fixtures for common scenarios

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

// Re-export core types for convenience
pub use lwkit_cache::{CacheKey, CachePayload, Clock, TtlCache};
pub use lwkit_core::{
    ApiError, ApiResult, BookmarkApi, Collection, CollectionId, CollectionRef, FilterCombination,
    Link, LinkId, LinkUpdate, NewCollection, NewLink, OwnerId, SearchParams, Tag, TagId,
};

// ============================================================================
// MOCK BOOKMARK API
// ============================================================================

/// Kind of remote call, used for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    ListCollections,
    ListTags,
    SearchLinks,
    CreateLink,
    UpdateLink,
    CreateCollection,
}

/// One recorded call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ListCollections,
    ListTags,
    SearchLinks(SearchParams),
    CreateLink(NewLink),
    UpdateLink(LinkUpdate),
    CreateCollection(NewCollection),
}

impl ApiCall {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::ListCollections => CallKind::ListCollections,
            Self::ListTags => CallKind::ListTags,
            Self::SearchLinks(_) => CallKind::SearchLinks,
            Self::CreateLink(_) => CallKind::CreateLink,
            Self::UpdateLink(_) => CallKind::UpdateLink,
            Self::CreateCollection(_) => CallKind::CreateCollection,
        }
    }
}

#[derive(Debug)]
struct MockState {
    collections: Vec<Collection>,
    tags: Vec<Tag>,
    links: Vec<Link>,
    default_collection: Collection,
    next_id: i64,
    failures: HashMap<CallKind, ApiError>,
    search_failures: HashMap<FilterCombination, ApiError>,
    ignore_collection_updates: bool,
    calls: Vec<ApiCall>,
}

/// In-memory bookmark service.
///
/// Behaves like the real service, including its create-time defect: links
/// are always created in the default collection and only move when updated.
#[derive(Debug)]
pub struct MockBookmarkApi {
    state: Mutex<MockState>,
}

impl Default for MockBookmarkApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBookmarkApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                collections: Vec::new(),
                tags: Vec::new(),
                links: Vec::new(),
                default_collection: fixtures::collection_owned(1, "Unorganized", 1),
                next_id: 1000,
                failures: HashMap::new(),
                search_failures: HashMap::new(),
                ignore_collection_updates: false,
                calls: Vec::new(),
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub fn with_collections(self, collections: Vec<Collection>) -> Self {
        self.state().collections = collections;
        self
    }

    pub fn with_tags(self, tags: Vec<Tag>) -> Self {
        self.state().tags = tags;
        self
    }

    pub fn with_links(self, links: Vec<Link>) -> Self {
        self.state().links = links;
        self
    }

    /// Make every call of `kind` fail with `error`.
    pub fn fail_on(&self, kind: CallKind, error: ApiError) {
        self.state().failures.insert(kind, error);
    }

    /// Make searches for exactly `combination` fail with `error`.
    pub fn fail_search_for(&self, combination: FilterCombination, error: ApiError) {
        self.state().search_failures.insert(combination, error);
    }

    /// Accept link updates but leave the collection unchanged.
    pub fn ignore_collection_updates(&self) {
        self.state().ignore_collection_updates = true;
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, kind: CallKind) -> usize {
        self.state().calls.iter().filter(|c| c.kind() == kind).count()
    }

    /// Search calls made so far.
    pub fn search_calls(&self) -> Vec<SearchParams> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                ApiCall::SearchLinks(params) => Some(params.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn stored_collections(&self) -> Vec<Collection> {
        self.state().collections.clone()
    }

    fn begin(&self, call: ApiCall) -> Result<std::sync::MutexGuard<'_, MockState>, ApiError> {
        let mut state = self.state();
        let kind = call.kind();
        state.calls.push(call);
        if let Some(err) = state.failures.get(&kind).cloned() {
            return Err(err);
        }
        Ok(state)
    }
}

fn matches_search(link: &Link, params: &SearchParams) -> bool {
    let query = params.text_query.trim().to_lowercase();
    let text_ok = query.is_empty()
        || link.name.to_lowercase().contains(&query)
        || link.url.to_lowercase().contains(&query)
        || link.description.to_lowercase().contains(&query)
        || link.tags.iter().any(|t| t.name.to_lowercase().contains(&query));
    let collection_ok = params
        .combination
        .collection_id
        .map_or(true, |id| link.collection_id() == Some(id));
    let tag_ok = params
        .combination
        .tag_id
        .map_or(true, |id| link.tags.iter().any(|t| t.id == Some(id)));
    text_ok && collection_ok && tag_ok
}

#[async_trait]
impl BookmarkApi for MockBookmarkApi {
    async fn list_collections(&self) -> ApiResult<Vec<Collection>> {
        let state = self.begin(ApiCall::ListCollections)?;
        Ok(state.collections.clone())
    }

    async fn list_tags(&self) -> ApiResult<Vec<Tag>> {
        let state = self.begin(ApiCall::ListTags)?;
        Ok(state.tags.clone())
    }

    async fn search_links(&self, params: &SearchParams) -> ApiResult<Vec<Link>> {
        let state = self.begin(ApiCall::SearchLinks(params.clone()))?;
        if let Some(err) = state.search_failures.get(&params.combination) {
            return Err(err.clone());
        }
        Ok(state
            .links
            .iter()
            .filter(|link| matches_search(link, params))
            .cloned()
            .collect())
    }

    async fn create_link(&self, link: &NewLink) -> ApiResult<Link> {
        let mut state = self.begin(ApiCall::CreateLink(link.clone()))?;
        state.next_id += 1;
        let id = state.next_id;
        let tags = link
            .tags
            .iter()
            .map(|tag| match tag.id {
                Some(_) => tag.clone(),
                None => Tag::existing(TagId(id * 10), tag.name.clone()),
            })
            .collect();
        let created = Link {
            id: Some(LinkId(id)),
            url: link.url.clone(),
            name: link.name.clone(),
            description: link.description.clone(),
            tags,
            collection: Some(state.default_collection.clone()),
            created_at: Some(fixtures::epoch()),
        };
        state.links.push(created.clone());
        Ok(created)
    }

    async fn update_link(&self, update: &LinkUpdate) -> ApiResult<Link> {
        let mut state = self.begin(ApiCall::UpdateLink(update.clone()))?;
        let ignore = state.ignore_collection_updates;
        let target = state
            .collections
            .iter()
            .find(|c| c.id == Some(update.collection_id))
            .cloned()
            .unwrap_or_else(|| {
                fixtures::collection_owned(
                    update.collection.id.get(),
                    &update.collection.name,
                    update.collection.owner_id.get(),
                )
            });
        let link = state
            .links
            .iter_mut()
            .find(|l| l.id == Some(update.id))
            .ok_or_else(|| ApiError::from_status(404, "Not Found", "Link not found"))?;
        link.url = update.url.clone();
        link.name = update.name.clone();
        link.description = update.description.clone();
        link.tags = update.tags.clone();
        if !ignore {
            link.collection = Some(target);
        }
        Ok(link.clone())
    }

    async fn create_collection(&self, collection: &NewCollection) -> ApiResult<Collection> {
        let mut state = self.begin(ApiCall::CreateCollection(collection.clone()))?;
        state.next_id += 1;
        let created = Collection {
            id: Some(CollectionId(state.next_id)),
            name: collection.name.clone(),
            description: Some(collection.description.clone()),
            owner_id: Some(OwnerId(1)),
            count: None,
        };
        state.collections.push(created.clone());
        Ok(created)
    }
}

// ============================================================================
// MANUAL CLOCK
// ============================================================================

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(fixtures::epoch())
    }
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap_or_else(|err| err.into_inner());
        *now += chrono::Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|err| err.into_inner())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating lwkit types.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,15}"
    }

    pub fn arb_tag() -> impl Strategy<Value = Tag> {
        (proptest::option::of(1i64..10_000), arb_name())
            .prop_map(|(id, name)| Tag { id: id.map(TagId), name })
    }

    pub fn arb_collection() -> impl Strategy<Value = Collection> {
        (1i64..10_000, arb_name(), proptest::option::of(1i64..5)).prop_map(
            |(id, name, owner)| Collection {
                id: Some(CollectionId(id)),
                name,
                description: None,
                owner_id: owner.map(OwnerId),
                count: None,
            },
        )
    }

    pub fn arb_link() -> impl Strategy<Value = Link> {
        (
            1i64..10_000,
            "[a-z]{1,10}",
            arb_name(),
            prop::collection::vec(arb_tag(), 0..4),
        )
            .prop_map(|(id, host, name, tags)| Link {
                id: Some(LinkId(id)),
                url: format!("https://{host}.example"),
                name,
                description: String::new(),
                tags,
                collection: None,
                created_at: None,
            })
    }

    pub fn arb_cache_payload() -> impl Strategy<Value = CachePayload> {
        prop_oneof![
            prop::collection::vec(arb_collection(), 0..5).prop_map(CachePayload::CollectionList),
            prop::collection::vec(arb_tag(), 0..5).prop_map(CachePayload::TagList),
        ]
    }

    /// Arbitrary logical keys, including characters the key sanitizer drops.
    pub fn arb_logical_key() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_./:@ -]{1,40}"
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// Fixed instant used as the start of every test timeline.
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn collection(id: i64, name: &str) -> Collection {
        Collection {
            id: Some(CollectionId(id)),
            name: name.to_string(),
            description: None,
            owner_id: None,
            count: None,
        }
    }

    pub fn collection_owned(id: i64, name: &str, owner: i64) -> Collection {
        Collection {
            owner_id: Some(OwnerId(owner)),
            ..collection(id, name)
        }
    }

    pub fn tag(id: i64, name: &str) -> Tag {
        Tag::existing(TagId(id), name)
    }

    pub fn link(id: i64, url: &str, name: &str) -> Link {
        Link {
            id: Some(LinkId(id)),
            url: url.to_string(),
            name: name.to_string(),
            description: String::new(),
            tags: Vec::new(),
            collection: None,
            created_at: None,
        }
    }

    /// A link filed under `collection` and tagged with `tags`.
    pub fn filed_link(id: i64, collection: &Collection, tags: &[Tag]) -> Link {
        Link {
            tags: tags.to_vec(),
            collection: Some(collection.clone()),
            ..link(id, &format!("https://example.com/{id}"), &format!("Link {id}"))
        }
    }
}
