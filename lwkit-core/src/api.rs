//! Remote bookmark API seam.
//!
//! Orchestration code talks to the service only through [`BookmarkApi`], so
//! the reqwest-backed client and in-memory test doubles are interchangeable.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::{Collection, Link, LinkUpdate, NewCollection, NewLink, Tag};
use crate::error::ApiResult;
use crate::filter::SearchParams;

/// Envelope every service response is wrapped in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub response: T,
}

/// Operations the core needs from the bookmark service.
///
/// Implementations surface every failure exactly once; retry policy, if any,
/// belongs to the caller.
#[async_trait]
pub trait BookmarkApi: Send + Sync {
    /// List every collection visible to the credential.
    async fn list_collections(&self) -> ApiResult<Vec<Collection>>;

    /// List every tag visible to the credential.
    async fn list_tags(&self) -> ApiResult<Vec<Tag>>;

    /// Run one search call with at most one collection and one tag filter.
    async fn search_links(&self, params: &SearchParams) -> ApiResult<Vec<Link>>;

    /// Create a link. Collection assignment is not part of the payload.
    async fn create_link(&self, link: &NewLink) -> ApiResult<Link>;

    /// Replace a link's full record.
    async fn update_link(&self, update: &LinkUpdate) -> ApiResult<Link>;

    /// Create a collection.
    async fn create_collection(&self, collection: &NewCollection) -> ApiResult<Collection>;
}

#[async_trait]
impl<T: BookmarkApi + ?Sized> BookmarkApi for Arc<T> {
    async fn list_collections(&self) -> ApiResult<Vec<Collection>> {
        (**self).list_collections().await
    }

    async fn list_tags(&self) -> ApiResult<Vec<Tag>> {
        (**self).list_tags().await
    }

    async fn search_links(&self, params: &SearchParams) -> ApiResult<Vec<Link>> {
        (**self).search_links(params).await
    }

    async fn create_link(&self, link: &NewLink) -> ApiResult<Link> {
        (**self).create_link(link).await
    }

    async fn update_link(&self, update: &LinkUpdate) -> ApiResult<Link> {
        (**self).update_link(update).await
    }

    async fn create_collection(&self, collection: &NewCollection) -> ApiResult<Collection> {
        (**self).create_collection(collection).await
    }
}
