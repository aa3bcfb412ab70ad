//! Launcher result items.
//!
//! Output is a single JSON document `{"items": [...]}` on stdout.

use lwkit_core::{Collection, Link};
use serde::Serialize;

use crate::query::ParsedQuery;

const ICON_PATH: &str = "icon.png";
const SEPARATOR: &str = " • ";
const MAX_TAGS_SHOWN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Icon {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LauncherItem {
    pub title: String,
    pub subtitle: String,
    pub arg: String,
    pub icon: Icon,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<String>,
}

impl LauncherItem {
    /// An actionable item.
    pub fn new(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        arg: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            arg: arg.into(),
            icon: Icon {
                path: ICON_PATH.to_string(),
            },
            valid: true,
            autocomplete: None,
        }
    }

    /// A non-actionable hint row.
    pub fn hint(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            valid: false,
            ..Self::new(title, subtitle, "")
        }
    }

    pub fn with_autocomplete(mut self, autocomplete: impl Into<String>) -> Self {
        self.autocomplete = Some(autocomplete.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LauncherOutput {
    pub items: Vec<LauncherItem>,
}

impl LauncherOutput {
    pub fn new(items: Vec<LauncherItem>) -> Self {
        Self { items }
    }

    /// A single invalid item carrying the error message.
    pub fn error(title: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::new(vec![LauncherItem::hint(title, message.to_string())])
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Cut `text` to `max_chars` characters, ending in `...` when shortened.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

fn tag_summary<'a>(
    names: impl Iterator<Item = &'a str>,
    highlight: impl Fn(&str) -> bool,
) -> Option<String> {
    let names: Vec<&str> = names.filter(|n| !n.is_empty()).collect();
    if names.is_empty() {
        return None;
    }
    let shown: Vec<String> = names
        .iter()
        .take(MAX_TAGS_SHOWN)
        .map(|name| {
            if highlight(name) {
                format!("#{name}")
            } else {
                name.to_string()
            }
        })
        .collect();
    let mut summary = shown.join(", ");
    if names.len() > MAX_TAGS_SHOWN {
        summary.push_str(&format!(" (+{} more)", names.len() - MAX_TAGS_SHOWN));
    }
    Some(summary)
}

fn link_title(link: &Link) -> String {
    if link.name.trim().is_empty() {
        truncate_text(&link.url, 60)
    } else {
        link.name.clone()
    }
}

/// A search hit. Tags named in the query are prefixed with `#`.
pub fn search_link_item(link: &Link, query: &ParsedQuery) -> LauncherItem {
    let mut parts = Vec::new();
    if !link.url.is_empty() {
        parts.push(truncate_text(&link.url, 40));
    }
    if let Some(collection) = link.collection.as_ref().filter(|c| !c.name.is_empty()) {
        parts.push(collection.name.clone());
    }
    if let Some(tags) = tag_summary(link.tags.iter().map(|t| t.name.as_str()), |n| {
        query.mentions_tag(n)
    }) {
        parts.push(tags);
    }
    LauncherItem::new(link_title(link), parts.join(SEPARATOR), link.url.clone())
}

/// A link shown while browsing one collection.
pub fn collection_link_item(link: &Link, collection_name: &str) -> LauncherItem {
    let mut parts = Vec::new();
    if !link.url.is_empty() {
        parts.push(truncate_text(&link.url, 50));
    }
    if let Some(tags) = tag_summary(link.tags.iter().map(|t| t.name.as_str()), |_| false) {
        parts.push(tags);
    }
    let subtitle = if parts.is_empty() {
        format!("Link in {collection_name}")
    } else {
        parts.join(SEPARATOR)
    };
    LauncherItem::new(link_title(link), subtitle, link.url.clone())
}

/// A collection row; selecting it autocompletes to `browse:<id>`.
pub fn collection_item(collection: &Collection) -> LauncherItem {
    let mut parts = Vec::new();
    let count = collection.link_count();
    if count > 0 {
        parts.push(format!("{count} link{}", if count == 1 { "" } else { "s" }));
    }
    if let Some(description) = collection.description.as_deref().filter(|d| !d.is_empty()) {
        parts.push(truncate_text(description, 60));
    }
    if parts.is_empty() {
        parts.push("Browse this collection".to_string());
    }
    let id = collection.id.map(|id| id.to_string()).unwrap_or_default();
    LauncherItem::hint(collection.name.clone(), parts.join(SEPARATOR))
        .with_autocomplete(format!("browse:{id}"))
}
