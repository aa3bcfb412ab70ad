//! Multi-filter search.
//!
//! The search endpoint takes at most one collection and one tag per call.
//! [`SearchAggregator`] expands a [`SearchFilterSet`] into single-filter
//! combinations, runs them one after another, and merges the results keeping
//! the first occurrence of each link id.

use std::collections::HashSet;
use std::sync::Arc;

use lwkit_core::{
    ApiError, ApiResult, BookmarkApi, CollectionId, FilterCombination, Link, LinkId,
    SearchFilterSet, SearchParams,
};
use tracing::{debug, warn};

use crate::reference::ReferenceDataCache;

/// Runs and merges search calls.
#[derive(Debug)]
pub struct SearchAggregator<A> {
    reference: Arc<ReferenceDataCache<A>>,
}

impl<A: BookmarkApi> SearchAggregator<A> {
    pub fn new(reference: Arc<ReferenceDataCache<A>>) -> Self {
        Self { reference }
    }

    /// Search with any number of collection and tag filters.
    ///
    /// A failing combination is skipped. If every combination fails, the
    /// last error is returned.
    pub async fn search(&self, filters: &SearchFilterSet, limit: usize) -> ApiResult<Vec<Link>> {
        let combinations = filters.combinations();
        debug!(
            query = %filters.text_query,
            combinations = combinations.len(),
            "searching"
        );

        let mut seen: HashSet<LinkId> = HashSet::new();
        let mut merged = Vec::new();
        let mut succeeded = 0usize;
        let mut last_error: Option<ApiError> = None;

        for combination in combinations {
            match self.run_one(&filters.text_query, combination).await {
                Ok(links) => {
                    succeeded += 1;
                    for link in links {
                        if let Some(id) = link.id {
                            if seen.insert(id) {
                                merged.push(link);
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        collection = ?combination.collection_id,
                        tag = ?combination.tag_id,
                        error = %err,
                        "search combination failed, skipping"
                    );
                    last_error = Some(err);
                }
            }
        }

        if succeeded == 0 {
            if let Some(err) = last_error {
                return Err(err);
            }
        }

        merged.truncate(limit);
        Ok(merged)
    }

    /// Resolve collection and tag names, then search.
    ///
    /// Unknown names are ignored. If names were given but none resolved for
    /// a dimension, that dimension is left unfiltered.
    pub async fn search_by_names(
        &self,
        text_query: &str,
        collection_names: &[String],
        tag_names: &[String],
        limit: usize,
    ) -> ApiResult<Vec<Link>> {
        let collection_ids = self.reference.resolve_collection_ids(collection_names).await?;
        let tag_ids = self.reference.resolve_tag_ids(tag_names).await?;
        let filters = SearchFilterSet::text(text_query)
            .with_collections(collection_ids)
            .with_tags(tag_ids);
        self.search(&filters, limit).await
    }

    /// Newest links in one collection.
    pub async fn links_in_collection(
        &self,
        collection_id: CollectionId,
        limit: usize,
    ) -> ApiResult<Vec<Link>> {
        let filters = SearchFilterSet::default().with_collections([collection_id]);
        self.search(&filters, limit).await
    }

    async fn run_one(
        &self,
        text_query: &str,
        combination: FilterCombination,
    ) -> ApiResult<Vec<Link>> {
        let params = SearchParams::first_page(text_query, combination);
        self.reference.api().search_links(&params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lwkit_cache::TtlCache;
    use lwkit_core::{CacheTtls, TagId};
    use lwkit_test_utils::{fixtures, CallKind, MockBookmarkApi};
    use tempfile::TempDir;

    fn aggregator(
        api: MockBookmarkApi,
    ) -> (SearchAggregator<MockBookmarkApi>, Arc<MockBookmarkApi>, TempDir) {
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
        (SearchAggregator::new(reference), api, dir)
    }

    /// Collections A=1, B=2; tags X=10, Y=20. Link 100 sits in A with both
    /// tags, so (A,X) and (A,Y) both return it.
    fn two_by_two() -> MockBookmarkApi {
        let a = fixtures::collection(1, "A");
        let b = fixtures::collection(2, "B");
        let x = fixtures::tag(10, "X");
        let y = fixtures::tag(20, "Y");
        MockBookmarkApi::new()
            .with_collections(vec![a.clone(), b.clone()])
            .with_tags(vec![x.clone(), y.clone()])
            .with_links(vec![
                fixtures::filed_link(100, &a, &[x.clone(), y.clone()]),
                fixtures::filed_link(101, &b, &[y.clone()]),
                fixtures::filed_link(102, &a, &[x.clone()]),
            ])
    }

    #[tokio::test]
    async fn test_two_by_two_makes_four_calls_and_dedupes() {
        let (search, api, _dir) = aggregator(two_by_two());
        let filters = SearchFilterSet::text("")
            .with_collections([CollectionId(1), CollectionId(2)])
            .with_tags([TagId(10), TagId(20)]);

        let links = search.search(&filters, 20).await.unwrap();

        assert_eq!(api.call_count(CallKind::SearchLinks), 4);
        let ids: Vec<i64> = links.iter().filter_map(|l| l.id).map(|id| id.get()).collect();
        assert_eq!(ids.iter().filter(|&&id| id == 100).count(), 1);
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_combination_is_skipped() {
        let (search, api, _dir) = aggregator(two_by_two());
        api.fail_search_for(
            FilterCombination {
                collection_id: Some(CollectionId(1)),
                tag_id: Some(TagId(10)),
            },
            ApiError::Connection("reset".into()),
        );
        let filters = SearchFilterSet::text("")
            .with_collections([CollectionId(1), CollectionId(2)])
            .with_tags([TagId(10), TagId(20)]);

        let links = search.search(&filters, 20).await.unwrap();

        assert_eq!(api.call_count(CallKind::SearchLinks), 4);
        // (A,Y) still finds 100; (B,Y) finds 101; 102 was only reachable via (A,X).
        let ids: HashSet<i64> = links.iter().filter_map(|l| l.id).map(|id| id.get()).collect();
        assert_eq!(ids, HashSet::from([100, 101]));
    }

    #[tokio::test]
    async fn test_all_combinations_failing_returns_error() {
        let (search, api, _dir) = aggregator(two_by_two());
        api.fail_on(CallKind::SearchLinks, ApiError::from_status(500, "Internal Server Error", ""));
        let filters = SearchFilterSet::text("x").with_tags([TagId(10), TagId(20)]);
        let err = search.search(&filters, 20).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_limit_truncates_merged_results() {
        let (search, _api, _dir) = aggregator(two_by_two());
        let links = search.search(&SearchFilterSet::text(""), 2).await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].id, Some(LinkId(100)));
    }

    #[tokio::test]
    async fn test_unfiltered_search_is_one_call() {
        let (search, api, _dir) = aggregator(two_by_two());
        search.search(&SearchFilterSet::text("link"), 20).await.unwrap();
        let calls = api.search_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].combination, FilterCombination::default());
        assert_eq!(calls[0].cursor, 0);
    }

    #[tokio::test]
    async fn test_search_by_names_resolves_ids() {
        let (search, api, _dir) = aggregator(two_by_two());
        let links = search
            .search_by_names("", &["b".to_string()], &["unknown".to_string()], 20)
            .await
            .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].id, Some(LinkId(101)));
        let calls = api.search_calls();
        assert_eq!(calls[0].combination.collection_id, Some(CollectionId(2)));
        assert_eq!(calls[0].combination.tag_id, None);
    }

    #[tokio::test]
    async fn test_links_in_collection() {
        let (search, _api, _dir) = aggregator(two_by_two());
        let links = search.links_in_collection(CollectionId(1), 20).await.unwrap();
        let ids: Vec<LinkId> = links.iter().filter_map(|l| l.id).collect();
        assert_eq!(ids, vec![LinkId(100), LinkId(102)]);
    }
}
