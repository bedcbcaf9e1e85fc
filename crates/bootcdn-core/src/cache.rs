//! On-disk response cache for catalog lookups.
//! One JSON file per key under `<cache_dir>/responses`, named by the SHA-256 of the key.
//! Entries expire after a TTL; after each write the oldest entries are evicted
//! until the directory fits the size bound. Read failures are plain misses.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::catalog::{require_library_name, CatalogSource};
use crate::error::{CdnError, Result};
use crate::model::{LibraryCatalog, LibraryDetail};

pub const CATALOG_KEY: &str = "bootcdn.alllibs";
pub const NAMES_KEY: &str = "bootcdn.allnames";

pub fn library_key(name: &str) -> String {
    format!("library:{}", name)
}

/// Key under which a response from `origin` is stored.
pub fn scoped_key(origin: &str, key: &str) -> String {
    if origin.is_empty() {
        key.to_string()
    } else {
        format!("{}|{}", origin, key)
    }
}

#[derive(Serialize, Deserialize)]
struct Entry<T> {
    key: String,
    #[serde(rename = "storedAt")]
    stored_at: i64,
    value: T,
}

fn cache_error(operation: &str, key: Option<&str>, source: String) -> CdnError {
    CdnError::Cache {
        operation: operation.to_string(),
        key: key.map(String::from),
        source,
    }
}

pub struct ResponseCache {
    dir: PathBuf,
    ttl_secs: u64,
    max_bytes: u64,
}

impl ResponseCache {
    /// Cache rooted at `<cache_dir>/responses`. The directory is created lazily on first write.
    pub fn new(cache_dir: &Path, ttl_secs: u64, max_bytes: u64) -> Self {
        Self {
            dir: cache_dir.join("responses"),
            ttl_secs,
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.dir.join(format!("{:x}.json", hasher.finalize()))
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, Self::now())
    }

    fn get_at<T: DeserializeOwned>(&self, key: &str, now: i64) -> Option<T> {
        let body = fs::read(self.entry_path(key)).ok()?;
        let entry: Entry<T> = serde_json::from_slice(&body).ok()?;
        if entry.key != key {
            return None;
        }
        let age = now.saturating_sub(entry.stored_at);
        if age < 0 || age as u64 >= self.ttl_secs {
            return None;
        }
        Some(entry.value)
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.put_at(key, value, Self::now())
    }

    fn put_at<T: Serialize>(&self, key: &str, value: &T, now: i64) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| CdnError::io("cache_put", Some(&self.dir), e))?;
        let entry = Entry {
            key: key.to_string(),
            stored_at: now,
            value,
        };
        let body = serde_json::to_vec(&entry)
            .map_err(|e| cache_error("cache_put", Some(key), e.to_string()))?;
        let path = self.entry_path(key);
        fs::write(&path, body).map_err(|e| CdnError::io("cache_put", Some(&path), e))?;
        self.evict(&path)
    }

    /// Drop oldest entries until the total size fits `max_bytes`. `keep` is never removed.
    fn evict(&self, keep: &Path) -> Result<()> {
        let mut entries: Vec<(i64, u64, PathBuf)> = Vec::new();
        let mut total = 0u64;
        let dir = fs::read_dir(&self.dir).map_err(|e| CdnError::io("cache_evict", Some(&self.dir), e))?;
        for e in dir.flatten() {
            let path = e.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let size = e.metadata().map(|m| m.len()).unwrap_or(0);
            total += size;
            if path == keep {
                continue;
            }
            // unreadable entries sort first so they go before anything valid
            let stored_at = fs::read(&path)
                .ok()
                .and_then(|b| serde_json::from_slice::<Entry<IgnoredAny>>(&b).ok())
                .map(|entry| entry.stored_at)
                .unwrap_or(i64::MIN);
            entries.push((stored_at, size, path));
        }
        entries.sort_by_key(|(stored_at, _, _)| *stored_at);
        for (_, size, path) in entries {
            if total <= self.max_bytes {
                break;
            }
            if fs::remove_file(&path).is_ok() {
                total = total.saturating_sub(size);
            }
        }
        Ok(())
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        let dir = fs::read_dir(&self.dir).map_err(|e| CdnError::io("cache_clear", Some(&self.dir), e))?;
        for e in dir.flatten() {
            let path = e.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Total bytes currently stored.
    pub fn size_bytes(&self) -> u64 {
        let Ok(dir) = fs::read_dir(&self.dir) else {
            return 0;
        };
        dir.flatten()
            .filter_map(|e| e.metadata().ok())
            .filter(|m| m.is_file())
            .map(|m| m.len())
            .sum()
    }
}

/// A [`CatalogSource`] that answers from the response cache when it can.
/// Not-found libraries are never cached; failed cache writes only log a warning.
pub struct CachedCatalog<S> {
    inner: S,
    cache: ResponseCache,
}

impl<S: CatalogSource> CachedCatalog<S> {
    pub fn new(inner: S, cache: ResponseCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    fn key(&self, key: &str) -> String {
        scoped_key(&self.inner.origin(), key)
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.put(key, value) {
            crate::utils::log_warn(&format!("Could not cache {}: {}", key, e));
        }
    }
}

impl<S: CatalogSource> CatalogSource for CachedCatalog<S> {
    fn fetch_catalog(&self) -> Result<LibraryCatalog> {
        let key = self.key(CATALOG_KEY);
        if let Some(hit) = self.cache.get::<LibraryCatalog>(&key) {
            return Ok(hit);
        }
        let catalog = self.inner.fetch_catalog()?;
        self.store(&key, &catalog);
        Ok(catalog)
    }

    fn fetch_library_names(&self) -> Result<Vec<String>> {
        let key = self.key(NAMES_KEY);
        if let Some(hit) = self.cache.get::<Vec<String>>(&key) {
            return Ok(hit);
        }
        let names = self.inner.fetch_library_names()?;
        self.store(&key, &names);
        Ok(names)
    }

    fn fetch_library(&self, name: &str) -> Result<Option<LibraryDetail>> {
        require_library_name(name)?;
        let key = self.key(&library_key(name));
        if let Some(hit) = self.cache.get::<LibraryDetail>(&key) {
            return Ok(Some(hit));
        }
        let lib = self.inner.fetch_library(name)?;
        if let Some(ref detail) = lib {
            self.store(&key, detail);
        }
        Ok(lib)
    }

    fn origin(&self) -> String {
        self.inner.origin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LibrarySummary, VersionAsset};
    use std::cell::Cell;

    struct CountingSource {
        cdn: &'static str,
        catalog_calls: Cell<usize>,
        names_calls: Cell<usize>,
        library_calls: Cell<usize>,
    }

    impl CountingSource {
        fn new() -> Self {
            Self::with_cdn("https://cdn.bootcss.com")
        }

        fn with_cdn(cdn: &'static str) -> Self {
            Self {
                cdn,
                catalog_calls: Cell::new(0),
                names_calls: Cell::new(0),
                library_calls: Cell::new(0),
            }
        }
    }

    impl CatalogSource for CountingSource {
        fn fetch_catalog(&self) -> Result<LibraryCatalog> {
            self.catalog_calls.set(self.catalog_calls.get() + 1);
            Ok(vec![
                LibrarySummary::new("zepto", "", 1),
                LibrarySummary::new("axios", "", 2),
            ]
            .into())
        }

        fn fetch_library_names(&self) -> Result<Vec<String>> {
            self.names_calls.set(self.names_calls.get() + 1);
            Ok(vec!["zepto".to_string(), "axios".to_string()])
        }

        fn fetch_library(&self, name: &str) -> Result<Option<LibraryDetail>> {
            self.library_calls.set(self.library_calls.get() + 1);
            if name != "axios" {
                return Ok(None);
            }
            Ok(Some(LibraryDetail {
                name: name.to_string(),
                assets: vec![VersionAsset::new(name, self.cdn, "0.19.0", vec!["axios.min.js".to_string()])],
                ..LibraryDetail::default()
            }))
        }

        fn origin(&self) -> String {
            format!("https://api.bootcdn.cn {}", self.cdn)
        }
    }

    #[test]
    fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), 60, 1024 * 1024);
        cache.put("k", &vec!["a".to_string(), "b".to_string()]).unwrap();
        let hit: Option<Vec<String>> = cache.get("k");
        assert_eq!(hit, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(cache.get::<Vec<String>>("other"), None);
    }

    #[test]
    fn test_expired_entry_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), 60, 1024 * 1024);
        cache.put_at("k", &1u32, 1_000).unwrap();
        assert_eq!(cache.get_at::<u32>("k", 1_059), Some(1));
        assert_eq!(cache.get_at::<u32>("k", 1_060), None);
    }

    #[test]
    fn test_corrupt_entry_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), 60, 1024 * 1024);
        cache.put("k", &1u32).unwrap();
        fs::write(cache.entry_path("k"), b"{ nope").unwrap();
        assert_eq!(cache.get::<u32>("k"), None);
    }

    #[test]
    fn test_eviction_drops_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let payload = "x".repeat(100);
        let unbounded = ResponseCache::new(dir.path(), 3600, u64::MAX);
        unbounded.put_at("a", &payload, 1).unwrap();
        let entry_size = unbounded.size_bytes();
        let cache = ResponseCache::new(dir.path(), 3600, entry_size * 2);
        cache.put_at("b", &payload, 2).unwrap();
        cache.put_at("c", &payload, 3).unwrap();
        assert!(!cache.entry_path("a").exists());
        assert!(cache.entry_path("b").exists());
        assert!(cache.entry_path("c").exists());
        assert!(cache.size_bytes() <= entry_size * 2);
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), 60, 1024 * 1024);
        assert_eq!(cache.clear().unwrap(), 0);
        cache.put("a", &1u32).unwrap();
        cache.put("b", &2u32).unwrap();
        assert_eq!(cache.clear().unwrap(), 2);
        assert_eq!(cache.get::<u32>("a"), None);
    }

    #[test]
    fn test_cached_catalog_hits_source_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource::new();
        let cached = CachedCatalog::new(&source, ResponseCache::new(dir.path(), 60, 1024 * 1024));
        let first = cached.fetch_catalog().unwrap();
        let second = cached.fetch_catalog().unwrap();
        assert_eq!(first, second);
        assert_eq!(second.names(), vec!["zepto", "axios"]);
        assert_eq!(source.catalog_calls.get(), 1);

        assert!(cached.fetch_library("axios").unwrap().is_some());
        assert!(cached.fetch_library("axios").unwrap().is_some());
        assert_eq!(source.library_calls.get(), 1);
    }

    #[test]
    fn test_cached_catalog_does_not_cache_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource::new();
        let cached = CachedCatalog::new(&source, ResponseCache::new(dir.path(), 60, 1024 * 1024));
        assert!(cached.fetch_library("nope").unwrap().is_none());
        assert!(cached.fetch_library("nope").unwrap().is_none());
        assert_eq!(source.library_calls.get(), 2);
        assert!(cached.fetch_library("").unwrap_err().is_invalid_argument());
        assert_eq!(source.library_calls.get(), 2);
    }

    #[test]
    fn test_cached_catalog_caches_library_names() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource::new();
        let cached = CachedCatalog::new(&source, ResponseCache::new(dir.path(), 60, 1024 * 1024));
        assert_eq!(cached.fetch_library_names().unwrap(), vec!["zepto", "axios"]);
        assert_eq!(cached.fetch_library_names().unwrap(), vec!["zepto", "axios"]);
        assert_eq!(source.names_calls.get(), 1);

        let key = scoped_key(&source.origin(), NAMES_KEY);
        assert_eq!(
            cached.cache().get::<Vec<String>>(&key),
            Some(vec!["zepto".to_string(), "axios".to_string()])
        );
    }

    #[test]
    fn test_switching_cdn_does_not_serve_old_urls() {
        let dir = tempfile::tempdir().unwrap();
        let old = CountingSource::with_cdn("https://cdn.bootcss.com");
        let old_cached = CachedCatalog::new(&old, ResponseCache::new(dir.path(), 3600, 1024 * 1024));
        let first = old_cached.fetch_library("axios").unwrap().unwrap();
        assert!(first.assets[0].urls[0].starts_with("https://cdn.bootcss.com/"));

        let new = CountingSource::with_cdn("https://cdn.example.com");
        let new_cached = CachedCatalog::new(&new, ResponseCache::new(dir.path(), 3600, 1024 * 1024));
        let second = new_cached.fetch_library("axios").unwrap().unwrap();
        assert_eq!(
            second.assets[0].urls[0],
            "https://cdn.example.com/axios/0.19.0/axios.min.js"
        );
        assert_eq!(new.library_calls.get(), 1);

        // the old origin still has its own entry
        assert!(old_cached.fetch_library("axios").unwrap().is_some());
        assert_eq!(old.library_calls.get(), 1);
    }

    #[test]
    fn test_scoped_key() {
        assert_eq!(scoped_key("", CATALOG_KEY), "bootcdn.alllibs");
        assert_eq!(scoped_key("a b", "library:vue"), "a b|library:vue");
    }
}
