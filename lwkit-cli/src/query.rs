//! Launcher query syntax.
//!
//! `#tag` and `@collection` tokens become filters; so do the older
//! `tag:name`, `collection:name` and `col:name` forms. Everything else is
//! free text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("Invalid tag regex"));
static COLLECTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("Invalid collection regex"));

/// A search query split into text and filter names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Remaining words, single-spaced.
    pub text: String,
    pub tags: Vec<String>,
    pub collections: Vec<String>,
}

impl ParsedQuery {
    pub fn has_filters(&self) -> bool {
        !self.tags.is_empty() || !self.collections.is_empty()
    }

    /// True if `name` was one of the requested tags.
    pub fn mentions_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.to_lowercase() == name.to_lowercase())
    }

    pub fn mentions_collection(&self, name: &str) -> bool {
        self.collections
            .iter()
            .any(|c| c.to_lowercase() == name.to_lowercase())
    }
}

/// Split a search query into text, tag names, and collection names.
///
/// Filter names keep their first spelling and are de-duplicated without
/// regard to case. A `key:value` word whose key is not a filter stays in the
/// text, as does anything starting with `http`.
pub fn parse_search_query(query: &str) -> ParsedQuery {
    let mut tags = captures(&TAG_PATTERN, query);
    let mut collections = captures(&COLLECTION_PATTERN, query);

    let stripped = TAG_PATTERN.replace_all(query, "");
    let stripped = COLLECTION_PATTERN.replace_all(&stripped, "");

    let mut words = Vec::new();
    for word in stripped.split_whitespace() {
        if word.starts_with("http") {
            words.push(word);
            continue;
        }
        match word.split_once(':') {
            Some((key, value)) if is_filter_key(key) => {
                if value.is_empty() {
                    continue;
                }
                if key.eq_ignore_ascii_case("tag") {
                    tags.push(value.to_string());
                } else {
                    collections.push(value.to_string());
                }
            }
            _ => words.push(word),
        }
    }

    ParsedQuery {
        text: words.join(" "),
        tags: dedup(tags),
        collections: dedup(collections),
    }
}

fn is_filter_key(key: &str) -> bool {
    ["tag", "collection", "col"]
        .iter()
        .any(|k| key.eq_ignore_ascii_case(k))
}

fn captures(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect()
}

/// A save request typed into the launcher: a URL with optional filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveInput {
    pub url: String,
    pub tags: Vec<String>,
    pub collections: Vec<String>,
}

/// Split `example.com #work @dev` into a normalized URL and filter names.
pub fn parse_save_query(query: &str) -> SaveInput {
    let tags = dedup(captures(&TAG_PATTERN, query));
    let collections = dedup(captures(&COLLECTION_PATTERN, query));
    let stripped = TAG_PATTERN.replace_all(query, "");
    let stripped = COLLECTION_PATTERN.replace_all(&stripped, "");
    SaveInput {
        url: normalize_url(&stripped),
        tags,
        collections,
    }
}

/// Add `https://` to bare hostnames like `github.com/x`.
pub fn normalize_url(input: &str) -> String {
    let url = input.trim();
    if url.is_empty() || has_scheme(url) {
        return url.to_string();
    }
    if url.contains('.') && !url.contains(' ') {
        return format!("https://{url}");
    }
    url.to_string()
}

fn has_scheme(url: &str) -> bool {
    ["http://", "https://", "ftp://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// True if the input normalizes to a URL with a scheme and a host.
pub fn is_valid_url(input: &str) -> bool {
    reqwest::Url::parse(&normalize_url(input))
        .map(|url| url.host_str().is_some_and(|host| !host.is_empty()))
        .unwrap_or(false)
}

/// Host part of a URL, or the input when it does not parse.
pub fn extract_domain(input: &str) -> String {
    let normalized = normalize_url(input);
    reqwest::Url::parse(&normalized)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or(normalized)
}
