//! Remote entities and request payloads.
//!
//! These mirror the JSON shapes of the bookmark service. Unknown fields in
//! responses are ignored so server upgrades that add fields do not break
//! decoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::{CollectionId, LinkId, OwnerId, TagId};

// ============================================================================
// TAGS
// ============================================================================

/// A tag attached to links.
///
/// A tag without an `id` has not been created yet; the service creates it
/// when a link references it by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TagId>,
    pub name: String,
}

impl Tag {
    /// An existing tag.
    pub fn existing(id: TagId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    /// A name-only placeholder the service will create on first use.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

// ============================================================================
// COLLECTIONS
// ============================================================================

/// Aggregate counts the service attaches to a collection listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionCount {
    #[serde(default)]
    pub links: u64,
}

/// A named folder of links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CollectionId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<OwnerId>,
    #[serde(rename = "_count", default, skip_serializing_if = "Option::is_none")]
    pub count: Option<CollectionCount>,
}

impl Collection {
    /// Number of links the service reported for this collection, if any.
    pub fn link_count(&self) -> u64 {
        self.count.map(|c| c.links).unwrap_or(0)
    }

    /// Case-insensitive exact name comparison.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// Collection reference embedded in a full-record link update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRef {
    pub id: CollectionId,
    pub name: String,
    pub owner_id: OwnerId,
}

/// Payload for creating a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCollection {
    pub name: String,
    pub description: String,
}

impl NewCollection {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

// ============================================================================
// LINKS
// ============================================================================

/// A saved link as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LinkId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<Collection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// The service sends `null` for blank text fields on older records.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Link {
    /// Id of the collection this link is filed under, if the service reported one.
    pub fn collection_id(&self) -> Option<CollectionId> {
        self.collection.as_ref().and_then(|c| c.id)
    }

    /// Owner of the collection this link is filed under.
    pub fn collection_owner(&self) -> Option<OwnerId> {
        self.collection.as_ref().and_then(|c| c.owner_id)
    }

    /// Display title: the name, or the URL when the name is blank.
    pub fn title(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.url
        } else {
            &self.name
        }
    }
}

/// Payload for creating a link.
///
/// Carries no collection: the create endpoint ignores collection assignments
/// and always files new links under the default collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLink {
    pub url: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<Tag>,
}

/// Full-record replacement payload for the update endpoint.
///
/// The update endpoint rejects partial patches, so every field of the link
/// is republished alongside the target collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkUpdate {
    pub id: LinkId,
    pub url: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<Tag>,
    pub collection_id: CollectionId,
    pub collection: CollectionRef,
    pub owner_id: OwnerId,
}

impl LinkUpdate {
    /// Build a full-record update that moves `link` into `target`.
    pub fn file_into(id: LinkId, link: &Link, target: CollectionRef) -> Self {
        Self {
            id,
            url: link.url.clone(),
            name: link.name.clone(),
            description: link.description.clone(),
            tags: link.tags.clone(),
            collection_id: target.id,
            owner_id: target.owner_id,
            collection: target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_link_decodes_with_unknown_fields() {
        let raw = json!({
            "id": 12,
            "url": "https://example.com",
            "name": "Example",
            "description": "",
            "pinnedBy": [],
            "createdAt": "2024-03-01T12:00:00.000Z",
            "tags": [{"id": 3, "name": "rust", "ownerId": 1}],
            "collection": {"id": 9, "name": "Unorganized", "ownerId": 1}
        });
        let link: Link = serde_json::from_value(raw).unwrap();
        assert_eq!(link.id, Some(LinkId(12)));
        assert_eq!(link.collection_id(), Some(CollectionId(9)));
        assert_eq!(link.collection_owner(), Some(OwnerId(1)));
        assert_eq!(link.tags, vec![Tag::existing(TagId(3), "rust")]);
        assert!(link.created_at.is_some());
    }

    #[test]
    fn test_link_null_text_fields_decode_as_empty() {
        let raw = json!({"id": 1, "url": "https://a.example", "name": null, "description": null});
        let link: Link = serde_json::from_value(raw).unwrap();
        assert_eq!(link.name, "");
        assert_eq!(link.description, "");
        assert!(link.tags.is_empty());
    }

    #[test]
    fn test_placeholder_tag_omits_id() {
        let value = serde_json::to_value(Tag::placeholder("new")).unwrap();
        assert_eq!(value, json!({"name": "new"}));
    }

    #[test]
    fn test_new_link_has_no_collection_field() {
        let link = NewLink {
            url: "https://example.com".into(),
            name: "Example".into(),
            description: String::new(),
            tags: vec![],
        };
        let value = serde_json::to_value(link).unwrap();
        assert!(value.get("collectionId").is_none());
        assert!(value.get("collection").is_none());
    }

    #[test]
    fn test_link_update_carries_owner_at_both_levels() {
        let link = Link {
            id: Some(LinkId(5)),
            url: "https://example.com".into(),
            name: "Example".into(),
            description: "d".into(),
            tags: vec![Tag::placeholder("x")],
            collection: None,
            created_at: None,
        };
        let update = LinkUpdate::file_into(
            LinkId(5),
            &link,
            CollectionRef {
                id: CollectionId(8),
                name: "Work".into(),
                owner_id: OwnerId(2),
            },
        );
        let value = serde_json::to_value(update).unwrap();
        assert_eq!(value["collectionId"], json!(8));
        assert_eq!(value["ownerId"], json!(2));
        assert_eq!(value["collection"]["ownerId"], json!(2));
        assert_eq!(value["tags"], json!([{"name": "x"}]));
    }

    #[test]
    fn test_collection_name_matches_case_insensitive() {
        let collection = Collection {
            id: Some(CollectionId(1)),
            name: "Work".into(),
            description: None,
            owner_id: None,
            count: Some(CollectionCount { links: 4 }),
        };
        assert!(collection.name_matches("work"));
        assert!(collection.name_matches("WORK"));
        assert!(!collection.name_matches("wor"));
        assert_eq!(collection.link_count(), 4);
    }

    #[test]
    fn test_link_title_falls_back_to_url() {
        let link = Link {
            id: None,
            url: "https://example.com".into(),
            name: "  ".into(),
            description: String::new(),
            tags: vec![],
            collection: None,
            created_at: None,
        };
        assert_eq!(link.title(), "https://example.com");
    }
}
