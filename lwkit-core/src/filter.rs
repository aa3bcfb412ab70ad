//! Search filters and their expansion into single-filter queries.
//!
//! The search endpoint accepts at most one collection id and one tag id per
//! call. A [`SearchFilterSet`] with several of each is therefore expanded into
//! a union of [`FilterCombination`]s, one remote call per combination.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::identity::{CollectionId, TagId};

/// Free-text query plus any number of collection and tag filters.
///
/// Ids are held in ordered sets: duplicates collapse and expansion order is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilterSet {
    pub text_query: String,
    pub collection_ids: BTreeSet<CollectionId>,
    pub tag_ids: BTreeSet<TagId>,
}

impl SearchFilterSet {
    /// Create a filter set with only a text query.
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            text_query: query.into(),
            ..Self::default()
        }
    }

    /// Add collection filters.
    pub fn with_collections(mut self, ids: impl IntoIterator<Item = CollectionId>) -> Self {
        self.collection_ids.extend(ids);
        self
    }

    /// Add tag filters.
    pub fn with_tags(mut self, ids: impl IntoIterator<Item = TagId>) -> Self {
        self.tag_ids.extend(ids);
        self
    }

    /// Expand into the minimal set of single-filter combinations.
    ///
    /// - both sets non-empty: the full cartesian product
    /// - one set non-empty: one combination per element, other filter unset
    /// - no filters: exactly one unfiltered combination
    pub fn combinations(&self) -> Vec<FilterCombination> {
        match (self.collection_ids.is_empty(), self.tag_ids.is_empty()) {
            (false, false) => self
                .collection_ids
                .iter()
                .flat_map(|&collection| {
                    self.tag_ids.iter().map(move |&tag| FilterCombination {
                        collection_id: Some(collection),
                        tag_id: Some(tag),
                    })
                })
                .collect(),
            (false, true) => self
                .collection_ids
                .iter()
                .map(|&collection| FilterCombination {
                    collection_id: Some(collection),
                    tag_id: None,
                })
                .collect(),
            (true, false) => self
                .tag_ids
                .iter()
                .map(|&tag| FilterCombination {
                    collection_id: None,
                    tag_id: Some(tag),
                })
                .collect(),
            (true, true) => vec![FilterCombination::default()],
        }
    }
}

/// One concrete (collection, tag) pairing submitted as a single search call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterCombination {
    pub collection_id: Option<CollectionId>,
    pub tag_id: Option<TagId>,
}

/// Sort key understood by the search endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchSort {
    /// Newest links first.
    #[default]
    CreatedAt,
}

impl SearchSort {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
        }
    }
}

/// Parameters for one remote search call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub text_query: String,
    pub combination: FilterCombination,
    pub sort: SearchSort,
    pub cursor: u64,
}

impl SearchParams {
    /// First page of results for one combination.
    pub fn first_page(text_query: impl Into<String>, combination: FilterCombination) -> Self {
        Self {
            text_query: text_query.into(),
            combination,
            sort: SearchSort::CreatedAt,
            cursor: 0,
        }
    }

    /// Encode as query-string pairs.
    ///
    /// A non-empty text query is searched across name, url, description,
    /// text content, and tags.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let query = self.text_query.trim();
        if !query.is_empty() {
            pairs.push(("searchQueryString", query.to_string()));
            for field in [
                "searchByName",
                "searchByUrl",
                "searchByDescription",
                "searchByTextContent",
                "searchByTags",
            ] {
                pairs.push((field, "true".to_string()));
            }
        }
        if let Some(collection) = self.combination.collection_id {
            pairs.push(("collectionId", collection.to_string()));
        }
        if let Some(tag) = self.combination.tag_id {
            pairs.push(("tagId", tag.to_string()));
        }
        pairs.push(("sort", self.sort.as_param().to_string()));
        pairs.push(("cursor", self.cursor.to_string()));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfiltered_yields_single_plain_combination() {
        let combos = SearchFilterSet::text("rust").combinations();
        assert_eq!(combos, vec![FilterCombination::default()]);
    }

    #[test]
    fn test_collections_only() {
        let filters = SearchFilterSet::text("")
            .with_collections([CollectionId(2), CollectionId(1)]);
        let combos = filters.combinations();
        assert_eq!(combos.len(), 2);
        assert!(combos.iter().all(|c| c.tag_id.is_none()));
        assert_eq!(combos[0].collection_id, Some(CollectionId(1)));
    }

    #[test]
    fn test_tags_only() {
        let filters = SearchFilterSet::text("").with_tags([TagId(5)]);
        assert_eq!(
            filters.combinations(),
            vec![FilterCombination {
                collection_id: None,
                tag_id: Some(TagId(5)),
            }]
        );
    }

    #[test]
    fn test_cartesian_product() {
        let filters = SearchFilterSet::text("q")
            .with_collections([CollectionId(1), CollectionId(2)])
            .with_tags([TagId(10), TagId(20)]);
        let combos = filters.combinations();
        assert_eq!(combos.len(), 4);
        assert!(combos.contains(&FilterCombination {
            collection_id: Some(CollectionId(2)),
            tag_id: Some(TagId(10)),
        }));
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let filters = SearchFilterSet::text("")
            .with_collections([CollectionId(1), CollectionId(1)])
            .with_tags([TagId(3), TagId(3)]);
        assert_eq!(filters.combinations().len(), 1);
    }

    #[test]
    fn test_query_pairs_with_text_and_filters() {
        let params = SearchParams::first_page(
            " rust  ",
            FilterCombination {
                collection_id: Some(CollectionId(4)),
                tag_id: Some(TagId(9)),
            },
        );
        let pairs = params.to_query_pairs();
        assert!(pairs.contains(&("searchQueryString", "rust".to_string())));
        assert!(pairs.contains(&("searchByTags", "true".to_string())));
        assert!(pairs.contains(&("collectionId", "4".to_string())));
        assert!(pairs.contains(&("tagId", "9".to_string())));
        assert!(pairs.contains(&("sort", "createdAt".to_string())));
        assert!(pairs.contains(&("cursor", "0".to_string())));
    }

    #[test]
    fn test_query_pairs_without_text_skip_field_toggles() {
        let params = SearchParams::first_page("", FilterCombination::default());
        let pairs = params.to_query_pairs();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|(k, _)| !k.starts_with("searchBy")));
    }
}
