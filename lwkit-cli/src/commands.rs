//! Command handlers.
//!
//! Launcher commands return a [`LauncherOutput`]; the save action returns
//! the notification text; cache commands return a printable report.

use std::sync::Arc;

use chrono::Utc;
use lwkit_cache::{EntryStatus, TtlCache};
use lwkit_client::{
    ReferenceDataCache, RemoteClient, SaveCoordinator, SaveOutcome, SaveRequest, SaveState,
    SearchAggregator,
};
use lwkit_core::{ApiError, ApiResult, BookmarkApi, CacheTtls, ClientConfig, CollectionId};
use tracing::{debug, info};

use crate::error::CliResult;
use crate::format::{format_bytes, format_duration, format_percent};
use crate::launcher::{
    collection_item, collection_link_item, search_link_item, LauncherItem, LauncherOutput,
};
use crate::query::{
    extract_domain, is_valid_url, normalize_url, parse_save_query, parse_search_query,
};
use crate::save_arg::{self, SaveData};
use crate::title;

/// Everything the network-backed commands need, built once per process.
#[derive(Debug)]
pub struct Services<A> {
    reference: Arc<ReferenceDataCache<A>>,
    search: SearchAggregator<A>,
    saver: SaveCoordinator<A>,
    limit: usize,
}

impl Services<RemoteClient> {
    pub fn from_config(config: &ClientConfig) -> CliResult<Self> {
        let cache = Arc::new(TtlCache::open(&config.cache_dir)?);
        let api = Arc::new(RemoteClient::new(config)?);
        let reference = Arc::new(ReferenceDataCache::new(api, cache, config));
        Ok(Self::new(reference, config.search_limit))
    }
}

impl<A: BookmarkApi> Services<A> {
    pub fn new(reference: Arc<ReferenceDataCache<A>>, limit: usize) -> Self {
        Self {
            search: SearchAggregator::new(reference.clone()),
            saver: SaveCoordinator::new(reference.clone()),
            reference,
            limit,
        }
    }

    // ------------------------------------------------------------------------
    // search
    // ------------------------------------------------------------------------

    pub async fn search(&self, raw_query: &str) -> ApiResult<LauncherOutput> {
        let parsed = parse_search_query(raw_query);
        debug!(
            text = %parsed.text,
            tags = ?parsed.tags,
            collections = ?parsed.collections,
            "parsed query"
        );

        let links = self
            .search
            .search_by_names(&parsed.text, &parsed.collections, &parsed.tags, self.limit)
            .await?;

        if links.is_empty() {
            let items = if raw_query.trim().is_empty() {
                vec![
                    LauncherItem::hint(
                        "Search Links",
                        "Type to search your links by title, content, tags, or URL",
                    ),
                    LauncherItem::hint(
                        "Search Syntax",
                        "Use #tag @collection or mix: 'javascript #tutorial @work'",
                    ),
                    LauncherItem::hint(
                        "Examples",
                        "#work #important @dev python | tag:work collection:reading",
                    ),
                ]
            } else {
                vec![LauncherItem::hint(
                    "No results found",
                    format!("No links found for '{}'", raw_query.trim()),
                )]
            };
            return Ok(LauncherOutput::new(items));
        }

        let full_page = links.len() == self.limit;
        let mut items: Vec<LauncherItem> = links
            .iter()
            .map(|link| search_link_item(link, &parsed))
            .collect();
        if full_page {
            items.push(LauncherItem::hint(
                "More results available...",
                "Refine your search to see more specific results",
            ));
        }
        Ok(LauncherOutput::new(items))
    }

    // ------------------------------------------------------------------------
    // collections and browse
    // ------------------------------------------------------------------------

    /// List collections, or browse one when given `browse:<id>` or
    /// `collection:<id>`.
    pub async fn collections(&self, filter: &str) -> ApiResult<LauncherOutput> {
        if let Some(id) = browse_target(filter) {
            return self.browse(id).await;
        }

        let read = self.reference.collections_read().await?;
        let freshness = read.was_cache_hit().then(|| {
            format!(" • cached {} ago", format_duration(read.staleness(Utc::now())))
        });
        let collections = read.into_value();
        if collections.is_empty() {
            return Ok(LauncherOutput::new(vec![LauncherItem::hint(
                "No collections found",
                "Create some collections first",
            )]));
        }

        let needle = filter.trim().to_lowercase();
        let matching: Vec<_> = collections
            .iter()
            .filter(|c| {
                needle.is_empty()
                    || c.name.to_lowercase().contains(&needle)
                    || c.description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .collect();

        if matching.is_empty() {
            return Ok(LauncherOutput::new(vec![LauncherItem::hint(
                "No matching collections",
                format!("No collections match '{}'", filter.trim()),
            )]));
        }

        let mut items: Vec<LauncherItem> = matching.into_iter().map(collection_item).collect();
        if needle.is_empty() {
            items.insert(
                0,
                LauncherItem::hint(
                    "Browse Collections",
                    format!(
                        "Press Enter on a collection to view its links, or type to filter collections{}",
                        freshness.unwrap_or_default()
                    ),
                ),
            );
        }
        Ok(LauncherOutput::new(items))
    }

    pub async fn browse(&self, collection_id: CollectionId) -> ApiResult<LauncherOutput> {
        let name = self
            .reference
            .list_collections()
            .await?
            .into_iter()
            .find(|c| c.id == Some(collection_id))
            .map(|c| c.name)
            .unwrap_or_else(|| "Unknown Collection".to_string());

        let links = self
            .search
            .links_in_collection(collection_id, self.limit)
            .await?;
        if links.is_empty() {
            return Ok(LauncherOutput::new(vec![LauncherItem::hint(
                "No links in this collection",
                format!("Collection '{name}' is empty"),
            )]));
        }

        let mut items = vec![LauncherItem::hint(
            "← Back to Collections",
            "Return to collection browser (or clear the search)",
        )];
        items.extend(links.iter().map(|link| collection_link_item(link, &name)));
        Ok(LauncherOutput::new(items))
    }

    // ------------------------------------------------------------------------
    // save
    // ------------------------------------------------------------------------

    /// Save a link and return the notification text.
    ///
    /// A blank name is replaced with the page title.
    pub async fn save(&self, data: &SaveData) -> String {
        let url = data.url.trim();
        if url.is_empty() {
            return "Error: No URL to save".to_string();
        }

        let name = match data.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => title::resolve_title(url).await,
        };
        let request = SaveRequest {
            url: url.to_string(),
            name: name.clone(),
            description: data.description.clone().unwrap_or_default(),
            tags: data.tags.clone(),
            collection: data.collection().map(str::to_string),
        };
        info!(
            url = %request.url,
            collection = ?request.collection,
            tags = ?request.tags,
            "saving link"
        );

        match self.saver.save(&request).await {
            Ok(outcome) => save_message(&name, &request, &outcome),
            Err(err) => save_error_message(&name, &err),
        }
    }
}

fn browse_target(filter: &str) -> Option<CollectionId> {
    let filter = filter.trim();
    ["browse:", "collection:"]
        .iter()
        .find_map(|prefix| filter.strip_prefix(prefix))
        .and_then(|id| id.trim().parse().ok())
}

/// Notification text for a save that created the link.
pub fn save_message(title: &str, request: &SaveRequest, outcome: &SaveOutcome) -> String {
    let mut details = Vec::new();
    if let Some(wanted) = request.collection.as_deref() {
        let actual = outcome
            .link
            .collection
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("default collection");
        match outcome.state {
            SaveState::CollectionAssigned(_) => details.push(format!("@{wanted}")),
            _ => details.push(format!("@{actual} (manual move to @{wanted} needed)")),
        }
    }
    if !request.tags.is_empty() {
        details.push(format!("#{}", request.tags.join(", #")));
    }
    if details.is_empty() {
        format!("{title}\nSaved to default collection")
    } else {
        format!("{title}\n{}", details.join(" • "))
    }
}

/// Notification text for a save that failed outright.
pub fn save_error_message(title: &str, err: &ApiError) -> String {
    match err {
        ApiError::Conflict { .. } => {
            format!("Link Already Exists\n{title}\nThis URL is already saved")
        }
        ApiError::Unauthorized { .. } => {
            "Authentication Error\nInvalid API token\nCheck LW_API_TOKEN".to_string()
        }
        ApiError::NotFound { .. } => {
            "Connection Error\nAPI endpoint not found\nCheck LW_API_URL".to_string()
        }
        ApiError::BadRequest { .. } => {
            "Invalid Request\nBad URL format\nPlease check the URL and try again".to_string()
        }
        other => format!("Save Failed\n{title}\nFailed to save link: {other}"),
    }
}

/// Preview what a save will do. Needs no network.
pub fn save_filter(input: &str) -> CliResult<LauncherOutput> {
    if input.trim().is_empty() {
        return Ok(LauncherOutput::new(vec![
            LauncherItem::hint("Save Link", "Enter URL with optional tags and collections"),
            LauncherItem::hint("Syntax Examples", "example.com #work #important @dev"),
            LauncherItem::hint("Auto HTTPS", "github.com becomes https://github.com automatically"),
        ]));
    }

    let parsed = parse_save_query(input);
    if is_valid_url(&parsed.url) {
        let mut parts = vec![format!("URL: {}", parsed.url)];
        if !parsed.tags.is_empty() {
            let tags: Vec<String> = parsed.tags.iter().map(|t| format!("#{t}")).collect();
            parts.push(format!("Tags: {}", tags.join(", ")));
        }
        if !parsed.collections.is_empty() {
            let cols: Vec<String> = parsed.collections.iter().map(|c| format!("@{c}")).collect();
            parts.push(format!("Collections: {}", cols.join(", ")));
        }
        parts.push("Press Enter to save".to_string());

        let domain = extract_domain(&parsed.url);
        let arg = save_arg::encode(&SaveData::from(parsed))?;
        return Ok(LauncherOutput::new(vec![LauncherItem::new(
            format!("Save: {domain}"),
            parts.join(" • "),
            arg,
        )]));
    }

    let mut items = Vec::new();
    if input.contains('.') {
        items.push(LauncherItem::hint(
            "Auto-fix URL?",
            format!("Did you mean: {}", normalize_url(input)),
        ));
    }
    items.extend([
        LauncherItem::hint("Save Syntax", "example.com #work @dev (auto-adds https://)"),
        LauncherItem::hint(
            "Multiple Tags & Collections",
            "github.com #coding #tutorial @work @reference",
        ),
        LauncherItem::hint("Just URL works too", "https://example.com or example.com"),
    ]);
    Ok(LauncherOutput::new(items))
}

// ----------------------------------------------------------------------------
// cache maintenance
// ----------------------------------------------------------------------------

const RULE: &str = "========================================";

fn location_block(cache: &TtlCache) -> String {
    let info = cache.info();
    format!(
        "Cache Directory: {}\nCache Files: {}\nTotal Size: {}\n",
        info.location.display(),
        info.entry_count,
        format_bytes(info.total_size_bytes)
    )
}

/// Counters, hit rate, and configured TTLs.
pub fn cache_stats(cache: &TtlCache, ttls: &CacheTtls) -> String {
    let stats = cache.stats();
    let mut out = format!("Cache Statistics\n{RULE}\n{}\n", location_block(cache));

    out.push_str("Cache Configuration:\n");
    for (category, secs, mins) in ttls.summary() {
        out.push_str(&format!("  {} TTL: {mins}m ({secs}s)\n", capitalize(category.as_str())));
    }
    out.push('\n');

    out.push_str(&format!(
        "Request Statistics:\n  Hits: {}\n  Misses: {}\n  Total Requests: {}\n  Hit Rate: {}\n\n",
        stats.hits,
        stats.misses,
        stats.total_requests(),
        format_percent(stats.hit_rate())
    ));
    out.push_str(&format!(
        "Cache Operations:\n  Sets: {}\n  Expired: {}\n  Errors: {}\n",
        stats.sets, stats.expired, stats.errors
    ));
    if stats.total_requests() == 0 {
        out.push_str("\nNo cache activity in this process.\n");
    }
    out
}

/// Per-entry size, age, status, and item count.
pub fn cache_info(cache: &TtlCache) -> String {
    let mut out = format!("Cache Information\n{RULE}\n{}\n", location_block(cache));
    let entries = cache.entries();
    out.push_str("Cache Files:\n");
    if entries.is_empty() {
        out.push_str("  No cache files found\n");
        return out;
    }

    for entry in entries {
        let size = format_bytes(entry.size_bytes);
        if entry.status == EntryStatus::Unreadable {
            out.push_str(&format!("  {} (Size: {size}) - Cannot read content\n", entry.file_name));
            continue;
        }
        out.push_str(&format!("  {}\n      Size: {size}\n", entry.file_name));
        if let Some(created) = entry.created_at {
            out.push_str(&format!(
                "      Created: {}\n",
                created.format("%Y-%m-%d %H:%M:%S")
            ));
        }
        if let Some(age) = entry.age {
            out.push_str(&format!("      Age: {}\n", format_duration(age)));
        }
        match entry.status {
            EntryStatus::Valid => {
                out.push_str("      Status: valid\n");
                if let Some(remaining) = entry.remaining {
                    out.push_str(&format!("      Expires in: {}\n", format_duration(remaining)));
                }
            }
            _ => out.push_str("      Status: expired\n"),
        }
        if let Some(count) = entry.item_count {
            out.push_str(&format!("      Data: {count} items\n"));
        }
    }
    out
}

/// Remove every entry and reset statistics.
pub fn cache_clear(cache: &TtlCache) -> String {
    let removed = cache.clear();
    cache.reset_stats();
    format!("Cleared {removed} cache entries\nCache statistics have been reset.")
}

/// Remove expired and unreadable entries.
pub fn cache_cleanup(cache: &TtlCache) -> String {
    match cache.cleanup_expired() {
        0 => "No expired entries found".to_string(),
        n => format!("Removed {n} expired cache entries"),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
