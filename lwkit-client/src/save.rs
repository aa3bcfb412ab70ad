//! Two-phase link save.
//!
//! The create endpoint ignores any collection supplied with a new link and
//! files it under the default collection. Saving into a named collection is
//! therefore split in two:
//!
//! 1. **Create** the link without a collection. Failure here is the only
//!    fatal outcome.
//! 2. **Assign** the collection with a full-record update, then check the
//!    response to see whether the move actually happened.
//!
//! Tag and collection resolution failures degrade the save instead of
//! aborting it.

use std::sync::Arc;

use lwkit_core::{
    ApiError, ApiResult, BookmarkApi, CollectionId, CollectionRef, Link, LinkUpdate, NewLink,
    OwnerId, Tag,
};
use tracing::{debug, info, warn};

use crate::reference::ReferenceDataCache;

/// Owner assumed when neither the link nor the collection reports one.
const DEFAULT_OWNER: OwnerId = OwnerId(1);

/// A link to save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveRequest {
    pub url: String,
    pub name: String,
    pub description: String,
    /// Tag names; existing tags are matched case-insensitively.
    pub tags: Vec<String>,
    /// Target collection name, created if missing.
    pub collection: Option<String>,
}

impl SaveRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Where the save ended up. A failed create never reaches this type; it is
/// returned as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    /// Link created; no collection was requested or one could not be resolved.
    Created,
    /// Link created and filed under the intended collection.
    CollectionAssigned(CollectionId),
    /// The update succeeded but the link is still elsewhere.
    CollectionAssignMismatch {
        intended: CollectionId,
        actual: Option<CollectionId>,
    },
    /// The update call itself failed.
    CollectionAssignFailed {
        intended: CollectionId,
        error: ApiError,
    },
}

/// Result of a save: the link always exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// The updated link when assignment succeeded, else the created link.
    pub link: Link,
    pub state: SaveState,
    /// Requested collection name that could not be found or created.
    pub unresolved_collection: Option<String>,
}

impl SaveOutcome {
    /// True if a requested collection did not end up on the link.
    pub fn is_degraded(&self) -> bool {
        self.unresolved_collection.is_some()
            || matches!(
                self.state,
                SaveState::CollectionAssignMismatch { .. }
                    | SaveState::CollectionAssignFailed { .. }
            )
    }

    /// Collection the link is filed under according to the service.
    pub fn collection_id(&self) -> Option<CollectionId> {
        self.link.collection_id()
    }
}

/// Drives the create-then-assign protocol.
#[derive(Debug)]
pub struct SaveCoordinator<A> {
    reference: Arc<ReferenceDataCache<A>>,
}

impl<A: BookmarkApi> SaveCoordinator<A> {
    pub fn new(reference: Arc<ReferenceDataCache<A>>) -> Self {
        Self { reference }
    }

    /// Save a link, filing it into the requested collection when possible.
    pub async fn save(&self, request: &SaveRequest) -> ApiResult<SaveOutcome> {
        let tags = self.resolve_tags(&request.tags).await;

        let collection_name = request
            .collection
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let target = match collection_name {
            Some(name) => self.resolve_collection(name).await,
            None => None,
        };
        let unresolved_collection = match (collection_name, &target) {
            (Some(name), None) => Some(name.to_string()),
            _ => None,
        };

        // Phase 1
        let new_link = NewLink {
            url: request.url.clone(),
            name: request.name.clone(),
            description: request.description.clone(),
            tags,
        };
        let created = self.reference.api().create_link(&new_link).await?;
        info!(id = ?created.id, url = %created.url, "link created");

        let Some(target) = target else {
            return Ok(SaveOutcome {
                link: created,
                state: SaveState::Created,
                unresolved_collection,
            });
        };

        // Phase 2
        let state_and_link = self.assign(&created, target).await;
        let (state, link) = match state_and_link {
            Ok(updated) => updated,
            Err(state) => (state, created),
        };
        Ok(SaveOutcome {
            link,
            state,
            unresolved_collection,
        })
    }

    /// Returns the assigned state with the updated link, or a degraded state
    /// for which the created link should be reported.
    async fn assign(
        &self,
        created: &Link,
        target: TargetCollection,
    ) -> Result<(SaveState, Link), SaveState> {
        let intended = target.id;
        let Some(link_id) = created.id else {
            warn!("created link has no id, cannot assign collection");
            return Err(SaveState::CollectionAssignFailed {
                intended,
                error: ApiError::Decode("created link has no id".to_string()),
            });
        };

        let owner_id = created
            .collection_owner()
            .or(target.owner_id)
            .unwrap_or(DEFAULT_OWNER);
        let update = LinkUpdate::file_into(
            link_id,
            created,
            CollectionRef {
                id: intended,
                name: target.name,
                owner_id,
            },
        );
        debug!(link = %link_id, collection = %intended, owner = %owner_id, "assigning collection");

        match self.reference.api().update_link(&update).await {
            Ok(updated) if updated.collection_id() == Some(intended) => {
                info!(link = %link_id, collection = %intended, "collection assigned");
                Ok((SaveState::CollectionAssigned(intended), updated))
            }
            Ok(updated) => {
                let actual = updated.collection_id();
                warn!(
                    link = %link_id,
                    intended = %intended,
                    actual = ?actual,
                    "collection update did not stick"
                );
                Err(SaveState::CollectionAssignMismatch { intended, actual })
            }
            Err(error) => {
                warn!(link = %link_id, error = %error, "collection update failed");
                Err(SaveState::CollectionAssignFailed { intended, error })
            }
        }
    }

    /// Reuse existing tags by name; anything else becomes a placeholder the
    /// service creates on use. A listing failure makes every tag a placeholder.
    async fn resolve_tags(&self, names: &[String]) -> Vec<Tag> {
        let mut seen = std::collections::HashSet::new();
        let names: Vec<&str> = names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .filter(|n| seen.insert(n.to_lowercase()))
            .collect();
        if names.is_empty() {
            return Vec::new();
        }

        let existing = match self.reference.list_tags().await {
            Ok(tags) => tags,
            Err(err) => {
                warn!(error = %err, "could not list tags, sending names only");
                Vec::new()
            }
        };

        names
            .into_iter()
            .map(|name| {
                existing
                    .iter()
                    .find(|t| t.id.is_some() && t.name.to_lowercase() == name.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| Tag::placeholder(name))
            })
            .collect()
    }

    /// Find or create the named collection. Any failure yields `None`.
    async fn resolve_collection(&self, name: &str) -> Option<TargetCollection> {
        match self.reference.find_collection_by_name(name).await {
            Ok(Some(found)) => {
                debug!(name = %found.name, id = ?found.id, "using existing collection");
                return TargetCollection::from_collection(found);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(name = %name, error = %err, "could not list collections, saving without one");
                return None;
            }
        }

        match self.reference.create_collection(name, "").await {
            Ok(created) => TargetCollection::from_collection(created),
            Err(err) => {
                warn!(
                    name = %name,
                    error = %err,
                    "could not create collection, saving without one"
                );
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
struct TargetCollection {
    id: CollectionId,
    name: String,
    owner_id: Option<OwnerId>,
}

impl TargetCollection {
    fn from_collection(collection: lwkit_core::Collection) -> Option<Self> {
        Some(Self {
            id: collection.id?,
            name: collection.name,
            owner_id: collection.owner_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lwkit_cache::TtlCache;
    use lwkit_core::{CacheTtls, TagId};
    use lwkit_test_utils::{fixtures, ApiCall, CallKind, MockBookmarkApi};
    use tempfile::TempDir;

    fn coordinator(
        api: MockBookmarkApi,
    ) -> (SaveCoordinator<MockBookmarkApi>, Arc<MockBookmarkApi>, TempDir) {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(TtlCache::open(dir.path()).unwrap());
        let api = Arc::new(api);
        let reference = Arc::new(ReferenceDataCache::with_ttls(
            api.clone(),
            cache,
            "https://links.example.com",
            "token",
            CacheTtls::default(),
        ));
        (SaveCoordinator::new(reference), api, dir)
    }

    fn request(collection: Option<&str>, tags: &[&str]) -> SaveRequest {
        SaveRequest {
            url: "https://example.com/article".into(),
            name: "Article".into(),
            description: "worth reading".into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            collection: collection.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_new_collection_created_then_assigned() {
        let (saver, api, _dir) = coordinator(MockBookmarkApi::new());

        let outcome = saver.save(&request(Some("Work"), &[])).await.unwrap();

        assert_eq!(api.call_count(CallKind::CreateCollection), 1);
        assert_eq!(api.call_count(CallKind::CreateLink), 1);
        assert_eq!(api.call_count(CallKind::UpdateLink), 1);

        let created = api
            .stored_collections()
            .into_iter()
            .find(|c| c.name == "Work")
            .and_then(|c| c.id)
            .unwrap();
        assert_eq!(outcome.state, SaveState::CollectionAssigned(created));
        assert_eq!(outcome.collection_id(), Some(created));
        assert!(!outcome.is_degraded());

        let kinds: Vec<CallKind> = api.calls().iter().map(ApiCall::kind).collect();
        let create_pos = kinds.iter().position(|k| *k == CallKind::CreateLink).unwrap();
        let update_pos = kinds.iter().position(|k| *k == CallKind::UpdateLink).unwrap();
        assert!(create_pos < update_pos);
    }

    #[tokio::test]
    async fn test_existing_collection_matched_case_insensitively() {
        let api = MockBookmarkApi::new()
            .with_collections(vec![fixtures::collection_owned(7, "Work", 3)]);
        let (saver, api, _dir) = coordinator(api);

        let outcome = saver.save(&request(Some("work"), &[])).await.unwrap();

        assert_eq!(api.call_count(CallKind::CreateCollection), 0);
        assert_eq!(outcome.state, SaveState::CollectionAssigned(CollectionId(7)));
    }

    #[tokio::test]
    async fn test_update_carries_owner_from_created_link() {
        let api = MockBookmarkApi::new()
            .with_collections(vec![fixtures::collection_owned(7, "Work", 3)]);
        let (saver, api, _dir) = coordinator(api);
        saver.save(&request(Some("Work"), &[])).await.unwrap();

        let update = api
            .calls()
            .into_iter()
            .find_map(|call| match call {
                ApiCall::UpdateLink(update) => Some(update),
                _ => None,
            })
            .unwrap();
        // The mock files new links under a default collection owned by 1.
        assert_eq!(update.owner_id, OwnerId(1));
        assert_eq!(update.collection.owner_id, OwnerId(1));
        assert_eq!(update.collection_id, CollectionId(7));
        assert_eq!(update.collection.name, "Work");
        assert_eq!(update.url, "https://example.com/article");
    }

    #[tokio::test]
    async fn test_create_payload_has_no_collection() {
        let (saver, api, _dir) = coordinator(MockBookmarkApi::new());
        saver.save(&request(Some("Work"), &[])).await.unwrap();
        let created = api
            .calls()
            .into_iter()
            .find_map(|call| match call {
                ApiCall::CreateLink(link) => Some(link),
                _ => None,
            })
            .unwrap();
        let value = serde_json::to_value(created).unwrap();
        assert!(value.get("collectionId").is_none());
    }

    #[tokio::test]
    async fn test_mismatch_returns_phase_one_link() {
        let api = MockBookmarkApi::new()
            .with_collections(vec![fixtures::collection_owned(7, "Work", 1)]);
        api.ignore_collection_updates();
        let (saver, _api, _dir) = coordinator(api);

        let outcome = saver.save(&request(Some("Work"), &[])).await.unwrap();

        assert_eq!(
            outcome.state,
            SaveState::CollectionAssignMismatch {
                intended: CollectionId(7),
                actual: Some(CollectionId(1)),
            }
        );
        assert_eq!(outcome.collection_id(), Some(CollectionId(1)));
        assert!(outcome.is_degraded());
    }

    #[tokio::test]
    async fn test_update_failure_is_degraded_not_fatal() {
        let api = MockBookmarkApi::new()
            .with_collections(vec![fixtures::collection_owned(7, "Work", 1)]);
        api.fail_on(CallKind::UpdateLink, ApiError::from_status(400, "Bad Request", "bad"));
        let (saver, _api, _dir) = coordinator(api);

        let outcome = saver.save(&request(Some("Work"), &[])).await.unwrap();

        assert!(matches!(
            outcome.state,
            SaveState::CollectionAssignFailed { intended: CollectionId(7), .. }
        ));
        assert!(outcome.link.id.is_some());
    }

    #[tokio::test]
    async fn test_create_failure_is_fatal() {
        let api = MockBookmarkApi::new();
        api.fail_on(CallKind::CreateLink, ApiError::from_status(409, "Conflict", "exists"));
        let (saver, api, _dir) = coordinator(api);

        let err = saver.save(&request(Some("Work"), &[])).await.unwrap_err();

        assert_eq!(err.status(), Some(409));
        assert_eq!(api.call_count(CallKind::UpdateLink), 0);
    }

    #[tokio::test]
    async fn test_collection_failure_saves_without_collection() {
        let api = MockBookmarkApi::new();
        api.fail_on(CallKind::CreateCollection, ApiError::Connection("down".into()));
        let (saver, api, _dir) = coordinator(api);

        let outcome = saver.save(&request(Some("Work"), &[])).await.unwrap();

        assert_eq!(outcome.state, SaveState::Created);
        assert_eq!(outcome.unresolved_collection.as_deref(), Some("Work"));
        assert!(outcome.is_degraded());
        assert_eq!(api.call_count(CallKind::UpdateLink), 0);
    }

    #[tokio::test]
    async fn test_no_collection_is_single_phase() {
        let (saver, api, _dir) = coordinator(MockBookmarkApi::new());
        let outcome = saver.save(&request(None, &[])).await.unwrap();
        assert_eq!(outcome.state, SaveState::Created);
        assert!(!outcome.is_degraded());
        assert_eq!(api.call_count(CallKind::ListCollections), 0);
        assert_eq!(api.call_count(CallKind::UpdateLink), 0);
    }

    #[tokio::test]
    async fn test_tags_reuse_existing_and_placeholder_new() {
        let api = MockBookmarkApi::new().with_tags(vec![fixtures::tag(3, "Rust")]);
        let (saver, api, _dir) = coordinator(api);

        saver.save(&request(None, &["rust", "new-tag", "RUST"])).await.unwrap();

        let sent = api
            .calls()
            .into_iter()
            .find_map(|call| match call {
                ApiCall::CreateLink(link) => Some(link.tags),
                _ => None,
            })
            .unwrap();
        assert_eq!(sent, vec![Tag::existing(TagId(3), "Rust"), Tag::placeholder("new-tag")]);
    }

    #[tokio::test]
    async fn test_tag_listing_failure_falls_back_to_placeholders() {
        let api = MockBookmarkApi::new().with_tags(vec![fixtures::tag(3, "rust")]);
        api.fail_on(CallKind::ListTags, ApiError::Connection("down".into()));
        let (saver, api, _dir) = coordinator(api);

        saver.save(&request(None, &["rust"])).await.unwrap();

        let sent = api
            .calls()
            .into_iter()
            .find_map(|call| match call {
                ApiCall::CreateLink(link) => Some(link.tags),
                _ => None,
            })
            .unwrap();
        assert_eq!(sent, vec![Tag::placeholder("rust")]);
    }
}
