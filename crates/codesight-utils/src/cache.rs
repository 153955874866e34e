//! Small key-value cache with time-to-live lookups
//!
//! Used for state that should survive between runs but may go stale, such as
//! the result of the last update check. Callers receive the cache as an
//! explicit collaborator (`&mut dyn KvCache`) instead of touching files.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

/// A cached value and the moment it was stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// True when the entry is younger than `ttl` at `now`.
    #[must_use]
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.stored_at) < ttl
    }
}

/// Statistics for cache performance tracking
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub expired: usize,
    pub writes: usize,
}

/// Read/write/TTL contract for persisted key-value state
pub trait KvCache {
    /// Raw lookup regardless of age
    fn get(&mut self, key: &str) -> Result<Option<CacheEntry>>;

    /// Store `value` under `key`, stamped with `now`
    fn put(&mut self, key: &str, value: serde_json::Value, now: DateTime<Utc>) -> Result<()>;

    /// Lookup that ignores entries older than `ttl`
    fn get_fresh(
        &mut self,
        key: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<serde_json::Value>> {
        Ok(self
            .get(key)?
            .filter(|entry| entry.is_fresh(ttl, now))
            .map(|entry| entry.value))
    }
}

/// JSON-file backed cache. The whole map is loaded on open and rewritten
/// atomically on every `put`.
#[derive(Debug)]
pub struct FileKvCache {
    path: Utf8PathBuf,
    entries: BTreeMap<String, CacheEntry>,
    stats: CacheStats,
}

impl FileKvCache {
    /// Open (or lazily create) the cache file at `path`.
    ///
    /// An unreadable or corrupt file is treated as an empty cache.
    pub fn open(path: impl Into<Utf8PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Ignoring corrupt cache file {path}: {e}");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read cache file: {path}"));
            }
        };

        Ok(Self {
            path,
            entries,
            stats: CacheStats::default(),
        })
    }

    /// Open the default cache at `<CODESIGHT_HOME>/cache/kv.json`
    pub fn open_default() -> Result<Self> {
        Self::open(crate::paths::cache_dir().join("kv.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    #[must_use]
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn persist(&self) -> Result<()> {
        let json =
            serde_json::to_string_pretty(&self.entries).context("Failed to serialize cache")?;
        crate::atomic_write::write_file_atomic(&self.path, &json)
            .with_context(|| format!("Failed to write cache file: {}", self.path))?;
        Ok(())
    }
}

impl KvCache for FileKvCache {
    fn get(&mut self, key: &str) -> Result<Option<CacheEntry>> {
        let entry = self.entries.get(key).cloned();
        if entry.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        Ok(entry)
    }

    fn put(&mut self, key: &str, value: serde_json::Value, now: DateTime<Utc>) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: now,
            },
        );
        self.stats.writes += 1;
        self.persist()
    }

    fn get_fresh(
        &mut self,
        key: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<serde_json::Value>> {
        match self.get(key)? {
            Some(entry) if entry.is_fresh(ttl, now) => Ok(Some(entry.value)),
            Some(_) => {
                self.stats.expired += 1;
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

/// In-process cache; nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryKvCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl KvCache for MemoryKvCache {
    fn get(&mut self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: serde_json::Value, now: DateTime<Utc>) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: now,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn cache_path(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(temp.path().join("cache").join("kv.json")).unwrap()
    }

    #[test]
    fn test_put_then_get_survives_reopen() -> Result<()> {
        let temp = TempDir::new()?;
        let now = Utc::now();

        let mut cache = FileKvCache::open(cache_path(&temp))?;
        cache.put("update_check", json!({"latest": "1.2.0"}), now)?;
        drop(cache);

        let mut reopened = FileKvCache::open(cache_path(&temp))?;
        let entry = reopened.get("update_check")?.expect("entry persisted");
        assert_eq!(entry.value, json!({"latest": "1.2.0"}));
        assert_eq!(entry.stored_at, now);
        Ok(())
    }

    #[test]
    fn test_get_fresh_respects_ttl() -> Result<()> {
        let temp = TempDir::new()?;
        let stored = Utc::now();
        let mut cache = FileKvCache::open(cache_path(&temp))?;
        cache.put("k", json!(1), stored)?;

        let ttl = Duration::hours(24);
        assert_eq!(
            cache.get_fresh("k", ttl, stored + Duration::hours(23))?,
            Some(json!(1))
        );
        assert_eq!(cache.get_fresh("k", ttl, stored + Duration::hours(25))?, None);
        assert_eq!(cache.stats().expired, 1);
        Ok(())
    }

    #[test]
    fn test_corrupt_file_is_treated_as_empty() -> Result<()> {
        let temp = TempDir::new()?;
        let path = cache_path(&temp);
        crate::paths::ensure_dir_all(path.parent().unwrap())?;
        fs::write(&path, "{ not json")?;

        let mut cache = FileKvCache::open(&path)?;
        assert!(cache.get("anything")?.is_none());
        assert_eq!(cache.stats().misses, 1);
        Ok(())
    }

    #[test]
    fn test_memory_cache_uses_default_ttl_logic() -> Result<()> {
        let mut cache = MemoryKvCache::default();
        let now = Utc::now();
        cache.put("k", json!("v"), now - Duration::minutes(5))?;

        assert_eq!(
            cache.get_fresh("k", Duration::minutes(10), now)?,
            Some(json!("v"))
        );
        assert_eq!(cache.get_fresh("k", Duration::minutes(1), now)?, None);
        Ok(())
    }
}
