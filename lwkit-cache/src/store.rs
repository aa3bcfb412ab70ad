//! File-per-entry TTL cache.
//!
//! # Layout
//!
//! Each key is stored as `{dir}/{key}.json` containing a serialized
//! [`CacheEntry`]. Writes go to a temp file in the same directory and are
//! renamed into place, so a concurrent reader sees either the old entry or
//! the new one, never a partial write.
//!
//! # Failure policy
//!
//! No method returns an error. Read and decode failures become misses, write
//! failures return `false`, and both increment [`CacheStats::errors`].

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::entry::{CacheEntry, CachePayload, PayloadKind};
use crate::error::CacheError;
use crate::key::CacheKey;
use crate::read::CacheRead;
use crate::stats::CacheStats;

const ENTRY_EXTENSION: &str = "json";

/// Durable TTL cache shared by independent processes through a directory.
#[derive(Debug)]
pub struct TtlCache {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    stats: Mutex<CacheStats>,
}

/// Summary of the cache directory and this process's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheInfo {
    pub location: PathBuf,
    pub entry_count: usize,
    pub total_size_bytes: u64,
    pub stats: CacheStats,
}

/// State of one stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryStatus {
    Valid,
    Expired,
    Unreadable,
}

/// One stored entry as reported by [`TtlCache::entries`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySummary {
    pub file_name: String,
    pub size_bytes: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub age: Option<Duration>,
    /// Zero once expired.
    pub remaining: Option<Duration>,
    pub status: EntryStatus,
    pub item_count: Option<usize>,
}

impl TtlCache {
    /// Open (creating if needed) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        Self::with_clock(dir, Arc::new(SystemClock))
    }

    /// Open a cache that reads time from `clock`.
    pub fn with_clock(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            clock,
            stats: Mutex::new(CacheStats::default()),
        })
    }

    /// Directory holding the entries.
    pub fn location(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    fn record<F: FnOnce(&mut CacheStats)>(&self, update: F) {
        let mut stats = self.stats.lock().unwrap_or_else(|err| err.into_inner());
        update(&mut stats);
    }

    /// Get a value with its cache metadata.
    ///
    /// Returns `None` on a missing, expired, or unreadable entry. Expired and
    /// undecodable entries are removed.
    pub fn lookup(&self, key: &CacheKey) -> Option<CacheRead<CachePayload>> {
        self.read_entry(key, None)
    }

    /// Like [`TtlCache::lookup`], but an entry holding another kind of
    /// payload is treated as unreadable: counted as an error and a miss, and
    /// removed.
    pub fn lookup_kind(
        &self,
        key: &CacheKey,
        kind: PayloadKind,
    ) -> Option<CacheRead<CachePayload>> {
        self.read_entry(key, Some(kind))
    }

    fn read_entry(
        &self,
        key: &CacheKey,
        expected: Option<PayloadKind>,
    ) -> Option<CacheRead<CachePayload>> {
        let path = self.path_for(key);
        let seen = modified_time(&path);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(key = %key, "cache miss");
                self.record(|s| s.misses += 1);
                return None;
            }
            Err(err) => {
                warn!(key = %key, error = %err, "failed to read cache entry");
                self.record(|s| {
                    s.errors += 1;
                    s.misses += 1;
                });
                return None;
            }
        };

        let entry = match CacheEntry::from_json(&bytes) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(key = %key, error = %err, "removing unreadable cache entry");
                remove_if_unchanged(&path, seen);
                self.record(|s| {
                    s.errors += 1;
                    s.misses += 1;
                });
                return None;
            }
        };

        if let Some(kind) = expected.filter(|kind| *kind != entry.value.kind()) {
            warn!(
                key = %key,
                expected = kind.as_str(),
                found = entry.value.kind().as_str(),
                "removing cache entry of the wrong kind"
            );
            remove_if_unchanged(&path, seen);
            self.record(|s| {
                s.errors += 1;
                s.misses += 1;
            });
            return None;
        }

        if entry.is_expired(self.clock.now()) {
            debug!(key = %key, expires_at = %entry.expires_at, "cache entry expired");
            remove_if_unchanged(&path, seen);
            self.record(|s| {
                s.expired += 1;
                s.misses += 1;
            });
            return None;
        }

        debug!(key = %key, items = entry.value.item_count(), "cache hit");
        self.record(|s| s.hits += 1);
        Some(CacheRead::from_cache(
            entry.value,
            entry.created_at,
            entry.expires_at,
        ))
    }

    /// Get a value, or `None` on any kind of miss.
    pub fn get(&self, key: &CacheKey) -> Option<CachePayload> {
        self.lookup(key).map(CacheRead::into_value)
    }

    /// Store `value` for `ttl_secs`, replacing any existing entry.
    ///
    /// Returns `false` if the entry could not be written.
    pub fn set(&self, key: &CacheKey, value: CachePayload, ttl_secs: u64) -> bool {
        let result = CacheEntry::new(value, self.clock.now(), ttl_secs)
            .and_then(|entry| self.write_entry(key, &entry).map(|()| entry.value.item_count()));
        match result {
            Ok(items) => {
                debug!(key = %key, items, ttl_secs, "cache set");
                self.record(|s| s.sets += 1);
                true
            }
            Err(err) => {
                warn!(key = %key, error = %err, "failed to write cache entry");
                self.record(|s| s.errors += 1);
                false
            }
        }
    }

    fn write_entry(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError> {
        let bytes = entry.to_json()?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".lwkit-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }

    /// Remove one entry. Returns whether it existed.
    pub fn delete(&self, key: &CacheKey) -> bool {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => {
                debug!(key = %key, "cache entry deleted");
                true
            }
            Err(err) if err.kind() == ErrorKind::NotFound => false,
            Err(err) => {
                warn!(key = %key, error = %err, "failed to delete cache entry");
                self.record(|s| s.errors += 1);
                false
            }
        }
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let removed = self
            .entry_files()
            .into_iter()
            .filter(|path| fs::remove_file(path).is_ok())
            .count();
        debug!(removed, "cache cleared");
        removed
    }

    /// Remove expired and unreadable entries. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0usize;
        for path in self.entry_files() {
            let stale = match fs::read(&path) {
                Ok(bytes) => match CacheEntry::from_json(&bytes) {
                    Ok(entry) => entry.is_expired(now),
                    Err(_) => true,
                },
                Err(err) if err.kind() == ErrorKind::NotFound => false,
                Err(_) => true,
            };
            if stale && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        self.record(|s| s.expired += removed as u64);
        debug!(removed, "expired cache entries cleaned up");
        removed
    }

    /// Snapshot of this process's counters.
    pub fn stats(&self) -> CacheStats {
        *self.stats.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// Zero this process's counters.
    pub fn reset_stats(&self) {
        self.record(|s| *s = CacheStats::default());
    }

    pub fn info(&self) -> CacheInfo {
        let files = self.entry_files();
        let total_size_bytes = files
            .iter()
            .filter_map(|path| fs::metadata(path).ok())
            .map(|meta| meta.len())
            .sum();
        CacheInfo {
            location: self.dir.clone(),
            entry_count: files.len(),
            total_size_bytes,
            stats: self.stats(),
        }
    }

    /// Describe every stored entry, sorted by file name.
    pub fn entries(&self) -> Vec<EntrySummary> {
        let now = self.clock.now();
        let mut summaries: Vec<EntrySummary> = self
            .entry_files()
            .into_iter()
            .map(|path| summarize(&path, now))
            .collect();
        summaries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        summaries
    }

    fn entry_files(&self) -> Vec<PathBuf> {
        let dir = match fs::read_dir(&self.dir) {
            Ok(dir) => dir,
            Err(err) => {
                warn!(dir = %self.dir.display(), error = %err, "failed to list cache directory");
                return Vec::new();
            }
        };
        dir.filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION))
            .collect()
    }
}

fn summarize(path: &Path, now: DateTime<Utc>) -> EntrySummary {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let size_bytes = fs::metadata(path).map(|meta| meta.len()).unwrap_or(0);
    let entry = fs::read(path)
        .ok()
        .and_then(|bytes| CacheEntry::from_json(&bytes).ok());

    match entry {
        Some(entry) => EntrySummary {
            file_name,
            size_bytes,
            created_at: Some(entry.created_at),
            expires_at: Some(entry.expires_at),
            age: Some(entry.age(now)),
            remaining: Some(entry.remaining(now)),
            status: if entry.is_expired(now) {
                EntryStatus::Expired
            } else {
                EntryStatus::Valid
            },
            item_count: Some(entry.value.item_count()),
        },
        None => EntrySummary {
            file_name,
            size_bytes,
            created_at: None,
            expires_at: None,
            age: None,
            remaining: None,
            status: EntryStatus::Unreadable,
            item_count: None,
        },
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// Remove a stale entry unless another process replaced it after `seen`.
///
/// A replacement landing between the check and the removal is still lost;
/// the next read then refetches.
fn remove_if_unchanged(path: &Path, seen: Option<SystemTime>) -> bool {
    if let (Some(seen), Some(current)) = (seen, modified_time(path)) {
        if current != seen {
            debug!(path = %path.display(), "cache entry was replaced, keeping it");
            return false;
        }
    }
    remove_quietly(path);
    true
}

fn remove_quietly(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != ErrorKind::NotFound {
            debug!(path = %path.display(), error = %err, "failed to remove cache file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use lwkit_core::{Collection, CollectionId, Tag, TagId};
    use tempfile::TempDir;

    #[derive(Debug)]
    struct StepClock(Mutex<DateTime<Utc>>);

    impl StepClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            )))
        }

        fn advance(&self, secs: i64) {
            *self.0.lock().unwrap() += Duration::seconds(secs);
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn create_test_cache() -> (TtlCache, Arc<StepClock>, TempDir) {
        let dir = TempDir::new().unwrap();
        let clock = StepClock::new();
        let cache = TtlCache::with_clock(dir.path(), clock.clone()).unwrap();
        (cache, clock, dir)
    }

    fn tags() -> CachePayload {
        CachePayload::TagList(vec![Tag::placeholder("x")])
    }

    fn collections() -> CachePayload {
        CachePayload::CollectionList(vec![Collection {
            id: Some(CollectionId(1)),
            name: "Work".into(),
            description: None,
            owner_id: None,
            count: None,
        }])
    }

    #[test]
    fn test_set_and_get() {
        let (cache, _clock, _dir) = create_test_cache();
        let key = CacheKey::new("tags");

        assert!(cache.set(&key, tags(), 60));
        assert_eq!(cache.get(&key), Some(tags()));

        let stats = cache.stats();
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_get_nonexistent_is_a_plain_miss() {
        let (cache, _clock, _dir) = create_test_cache();
        assert_eq!(cache.get(&CacheKey::new("missing")), None);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.errors, 0);
    }

    #[test]
    fn test_ttl_expiry_removes_entry() {
        let (cache, clock, dir) = create_test_cache();
        let key = CacheKey::new("tags");
        assert!(cache.set(&key, tags(), 2));
        assert!(cache.get(&key).is_some());

        clock.advance(3);
        assert_eq!(cache.get(&key), None);
        assert!(!dir.path().join("tags.json").exists());

        let stats = cache.stats();
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_entry_at_exact_expiry_is_still_valid() {
        let (cache, clock, _dir) = create_test_cache();
        let key = CacheKey::new("tags");
        assert!(cache.set(&key, tags(), 2));
        clock.advance(2);
        assert!(cache.get(&key).is_some());
    }

    #[test]
    fn test_corrupted_entry_counts_error_and_is_removed() {
        let (cache, _clock, dir) = create_test_cache();
        let path = dir.path().join("tags.json");
        fs::write(&path, b"{not json").unwrap();

        assert_eq!(cache.get(&CacheKey::new("tags")), None);
        assert!(!path.exists());
        let stats = cache.stats();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let (cache, _clock, _dir) = create_test_cache();
        let key = CacheKey::new("tags");
        assert!(!cache.set(&key, tags(), 0));
        assert_eq!(cache.stats().errors, 1);
        assert_eq!(cache.stats().sets, 0);
    }

    #[test]
    fn test_set_overwrites() {
        let (cache, _clock, _dir) = create_test_cache();
        let key = CacheKey::new("k");
        assert!(cache.set(&key, tags(), 60));
        assert!(cache.set(&key, collections(), 60));
        assert_eq!(cache.get(&key), Some(collections()));
        assert_eq!(cache.info().entry_count, 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (cache, _clock, _dir) = create_test_cache();
        let key = CacheKey::new("k");
        assert!(cache.set(&key, tags(), 60));
        assert!(cache.delete(&key));
        assert!(!cache.delete(&key));
        assert_eq!(cache.stats().errors, 0);
    }

    #[test]
    fn test_clear_counts_removed_entries() {
        let (cache, _clock, dir) = create_test_cache();
        assert!(cache.set(&CacheKey::new("a"), tags(), 60));
        assert!(cache.set(&CacheKey::new("b"), tags(), 60));
        fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        assert_eq!(cache.clear(), 2);
        assert_eq!(cache.info().entry_count, 0);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_cleanup_removes_expired_and_unreadable_only() {
        let (cache, clock, dir) = create_test_cache();
        assert!(cache.set(&CacheKey::new("short"), tags(), 30));
        assert!(cache.set(&CacheKey::new("long"), tags(), 600));
        fs::write(dir.path().join("broken.json"), b"[").unwrap();

        clock.advance(60);
        assert_eq!(cache.cleanup_expired(), 2);
        assert_eq!(cache.stats().expired, 2);
        assert!(cache.get(&CacheKey::new("long")).is_some());
        assert!(!dir.path().join("short.json").exists());
        assert!(!dir.path().join("broken.json").exists());
    }

    #[test]
    fn test_info_and_entries() {
        let (cache, clock, dir) = create_test_cache();
        assert!(cache.set(&CacheKey::new("a"), tags(), 30));
        assert!(cache.set(&CacheKey::new("b"), collections(), 600));
        fs::write(dir.path().join("c.json"), b"garbage").unwrap();
        clock.advance(60);

        let info = cache.info();
        assert_eq!(info.entry_count, 3);
        assert!(info.total_size_bytes > 0);
        assert_eq!(info.location, dir.path());

        let entries = cache.entries();
        let statuses: Vec<_> = entries.iter().map(|e| (e.file_name.as_str(), e.status)).collect();
        assert_eq!(
            statuses,
            vec![
                ("a.json", EntryStatus::Expired),
                ("b.json", EntryStatus::Valid),
                ("c.json", EntryStatus::Unreadable),
            ]
        );
        assert_eq!(entries[1].item_count, Some(1));
        assert_eq!(entries[0].remaining, Some(std::time::Duration::ZERO));
        assert_eq!(entries[1].age, Some(std::time::Duration::from_secs(60)));
        assert_eq!(entries[1].remaining, Some(std::time::Duration::from_secs(540)));
        assert_eq!(entries[2].age, None);
        assert_eq!(entries[2].item_count, None);
    }

    #[test]
    fn test_reset_stats() {
        let (cache, _clock, _dir) = create_test_cache();
        cache.get(&CacheKey::new("x"));
        assert_eq!(cache.stats().misses, 1);
        cache.reset_stats();
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_lookup_reports_cache_metadata() {
        let (cache, _clock, _dir) = create_test_cache();
        let key = CacheKey::new("tags");
        assert!(cache.set(&key, CachePayload::TagList(vec![Tag::existing(TagId(1), "a")]), 60));
        let read = cache.lookup(&key).unwrap();
        assert!(read.was_cache_hit());
        assert!(read.expires_at().is_some());
    }

    #[test]
    fn test_wrong_kind_counts_as_miss() {
        let (cache, _clock, dir) = create_test_cache();
        let key = CacheKey::new("collections");
        assert!(cache.set(&key, tags(), 60));

        assert!(cache.lookup_kind(&key, PayloadKind::Collections).is_none());
        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.errors, 1);
        assert!(!dir.path().join("collections.json").exists());
    }

    #[test]
    fn test_lookup_kind_hit() {
        let (cache, _clock, _dir) = create_test_cache();
        let key = CacheKey::new("tags");
        assert!(cache.set(&key, tags(), 60));
        let read = cache.lookup_kind(&key, PayloadKind::Tags).unwrap();
        assert_eq!(read.into_value(), tags());
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_replaced_entry_survives_stale_removal() {
        let (cache, _clock, dir) = create_test_cache();
        assert!(cache.set(&CacheKey::new("a"), tags(), 60));
        let path = dir.path().join("a.json");
        let seen = modified_time(&path).unwrap();

        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(seen + std::time::Duration::from_secs(5)).unwrap();
        drop(file);

        assert!(!remove_if_unchanged(&path, Some(seen)));
        assert!(path.exists());
        assert!(remove_if_unchanged(&path, modified_time(&path)));
        assert!(!path.exists());
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let (cache, _clock, dir) = create_test_cache();
        assert!(cache.set(&CacheKey::new("a"), tags(), 60));
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json".to_string()]);
    }
}
