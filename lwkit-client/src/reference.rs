//! TTL-cached collection and tag listings.
//!
//! Collections and tags change rarely compared to how often the launcher
//! invokes the binary, so listings are memoized in the shared [`TtlCache`].
//! Search results are never cached here.

use std::sync::Arc;

use chrono::Utc;
use lwkit_cache::{CacheKey, CachePayload, CacheRead, PayloadKind, TtlCache};
use lwkit_core::{
    ApiResult, BookmarkApi, CacheTtls, ClientConfig, Collection, CollectionId, NewCollection, Tag,
    TagId,
};
use tracing::{debug, info};

/// Memoizing front for the listing endpoints.
#[derive(Debug)]
pub struct ReferenceDataCache<A> {
    api: Arc<A>,
    cache: Arc<TtlCache>,
    ttls: CacheTtls,
    collections_key: CacheKey,
    tags_key: CacheKey,
}

impl<A: BookmarkApi> ReferenceDataCache<A> {
    pub fn new(api: Arc<A>, cache: Arc<TtlCache>, config: &ClientConfig) -> Self {
        Self::with_ttls(api, cache, &config.api_url, &config.api_token, config.cache_ttls)
    }

    /// Build a cache scoped to one endpoint and credential.
    pub fn with_ttls(
        api: Arc<A>,
        cache: Arc<TtlCache>,
        api_url: &str,
        api_token: &str,
        ttls: CacheTtls,
    ) -> Self {
        Self {
            api,
            cache,
            ttls,
            collections_key: CacheKey::scoped(PayloadKind::Collections, api_url, api_token),
            tags_key: CacheKey::scoped(PayloadKind::Tags, api_url, api_token),
        }
    }

    /// The underlying remote API.
    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn cache(&self) -> &Arc<TtlCache> {
        &self.cache
    }

    pub fn ttls(&self) -> CacheTtls {
        self.ttls
    }

    /// List collections with cache metadata.
    pub async fn collections_read(&self) -> ApiResult<CacheRead<Vec<Collection>>> {
        let cached = self
            .cache
            .lookup_kind(&self.collections_key, PayloadKind::Collections)
            .and_then(|read| {
                let (cached_at, expires_at) = (read.cached_at(), read.expires_at());
                read.into_value().into_collections().map(|collections| {
                    CacheRead::from_cache(collections, cached_at, expires_at.unwrap_or(cached_at))
                })
            });
        if let Some(read) = cached {
            debug!(items = read.value().len(), "collections cache hit");
            return Ok(read);
        }

        debug!("collections cache miss, fetching");
        let collections = self.api.list_collections().await?;
        if !collections.is_empty() {
            self.cache.set(
                &self.collections_key,
                CachePayload::CollectionList(collections.clone()),
                self.ttls.collections_secs,
            );
        }
        Ok(CacheRead::from_source(collections, Utc::now()))
    }

    /// List collections, from cache when fresh.
    ///
    /// Empty listings are not cached.
    pub async fn list_collections(&self) -> ApiResult<Vec<Collection>> {
        self.collections_read().await.map(CacheRead::into_value)
    }

    /// List tags with cache metadata.
    pub async fn tags_read(&self) -> ApiResult<CacheRead<Vec<Tag>>> {
        let cached = self
            .cache
            .lookup_kind(&self.tags_key, PayloadKind::Tags)
            .and_then(|read| {
                let (cached_at, expires_at) = (read.cached_at(), read.expires_at());
                read.into_value().into_tags().map(|tags| {
                    CacheRead::from_cache(tags, cached_at, expires_at.unwrap_or(cached_at))
                })
            });
        if let Some(read) = cached {
            debug!(items = read.value().len(), "tags cache hit");
            return Ok(read);
        }

        debug!("tags cache miss, fetching");
        let tags = self.api.list_tags().await?;
        if !tags.is_empty() {
            self.cache.set(
                &self.tags_key,
                CachePayload::TagList(tags.clone()),
                self.ttls.tags_secs,
            );
        }
        Ok(CacheRead::from_source(tags, Utc::now()))
    }

    /// List tags, from cache when fresh.
    ///
    /// Empty listings are not cached.
    pub async fn list_tags(&self) -> ApiResult<Vec<Tag>> {
        self.tags_read().await.map(CacheRead::into_value)
    }

    /// Create a collection and drop the cached collection listing.
    ///
    /// The listing is invalidated whether or not the create succeeded: a
    /// timed-out create may still have landed server-side.
    pub async fn create_collection(&self, name: &str, description: &str) -> ApiResult<Collection> {
        let result = self
            .api
            .create_collection(&NewCollection::new(name, description))
            .await;
        self.invalidate_collections();
        let created = result?;
        info!(name = %created.name, id = ?created.id, "collection created");
        Ok(created)
    }

    pub fn invalidate_collections(&self) -> bool {
        self.cache.delete(&self.collections_key)
    }

    /// Case-insensitive exact lookup of a collection by name.
    pub async fn find_collection_by_name(&self, name: &str) -> ApiResult<Option<Collection>> {
        let collections = self.list_collections().await?;
        Ok(collections.into_iter().find(|c| c.name_matches(name)))
    }

    /// Case-insensitive exact lookup of a collection id by name.
    pub async fn resolve_collection_id_by_name(
        &self,
        name: &str,
    ) -> ApiResult<Option<CollectionId>> {
        Ok(self.find_collection_by_name(name).await?.and_then(|c| c.id))
    }

    /// Resolve collection names to ids, dropping unknown names.
    ///
    /// The listing is only fetched when at least one name is given.
    pub async fn resolve_collection_ids(&self, names: &[String]) -> ApiResult<Vec<CollectionId>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let collections = self.list_collections().await?;
        Ok(names
            .iter()
            .filter_map(|name| {
                let found = collections
                    .iter()
                    .find(|c| c.name_matches(name))
                    .and_then(|c| c.id);
                if found.is_none() {
                    debug!(name = %name, "unknown collection name ignored");
                }
                found
            })
            .collect())
    }

    /// Resolve tag names to ids, dropping unknown names.
    ///
    /// The listing is only fetched when at least one name is given.
    pub async fn resolve_tag_ids(&self, names: &[String]) -> ApiResult<Vec<TagId>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let tags = self.list_tags().await?;
        Ok(names
            .iter()
            .filter_map(|name| {
                let found = tags
                    .iter()
                    .find(|t| t.name.to_lowercase() == name.to_lowercase())
                    .and_then(|t| t.id);
                if found.is_none() {
                    debug!(name = %name, "unknown tag name ignored");
                }
                found
            })
            .collect())
    }
}
