//! Release check for codesight
//!
//! At most once per TTL window the latest published release is fetched from a
//! [`ReleaseSource`] and remembered in a [`KvCache`]. Every failure on this
//! path is logged at debug level and otherwise ignored.

mod github;
mod version;

pub use github::GithubReleases;
pub use version::{Version, is_newer};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use codesight_utils::cache::KvCache;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Cache key holding the last known release
pub const CACHE_KEY: &str = "latest_release";

/// How long a looked-up release is trusted
pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("release lookup failed: {0}")]
    Transport(String),

    #[error("unexpected release response: {0}")]
    BadResponse(String),
}

/// Somewhere the latest published version can be looked up
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Latest released version, without a leading `v`
    async fn latest_version(&self) -> Result<String, UpdateError>;
}

/// A newer release than the running binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNotice {
    pub current_version: String,
    pub latest_version: String,
}

impl UpdateNotice {
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "A new version of codesight is available: {} (current: {})",
            self.latest_version, self.current_version
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedRelease {
    latest_version: String,
}

pub struct UpdateChecker<S: ReleaseSource> {
    source: S,
    ttl: Duration,
}

impl<S: ReleaseSource> UpdateChecker<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Compare `current_version` with the latest release.
    ///
    /// A fresh cache entry answers without touching the source; otherwise the
    /// source is queried and the result cached at `now`.
    pub async fn check(
        &self,
        cache: &mut dyn KvCache,
        current_version: &str,
        now: DateTime<Utc>,
    ) -> Option<UpdateNotice> {
        let latest = match self.cached(cache, now) {
            Some(latest) => latest,
            None => self.fetch_and_store(cache, now).await?,
        };

        is_newer(&latest, current_version).then(|| UpdateNotice {
            current_version: current_version.to_string(),
            latest_version: latest,
        })
    }

    fn cached(&self, cache: &mut dyn KvCache, now: DateTime<Utc>) -> Option<String> {
        match cache.get_fresh(CACHE_KEY, self.ttl, now) {
            Ok(Some(value)) => serde_json::from_value::<CachedRelease>(value)
                .map(|cached| cached.latest_version)
                .map_err(|e| debug!("Ignoring malformed release cache entry: {e}"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                debug!("Release cache unavailable: {e:#}");
                None
            }
        }
    }

    async fn fetch_and_store(&self, cache: &mut dyn KvCache, now: DateTime<Utc>) -> Option<String> {
        let latest = match self.source.latest_version().await {
            Ok(latest) => latest,
            Err(e) => {
                debug!("Update check skipped: {e}");
                return None;
            }
        };

        let entry = CachedRelease {
            latest_version: latest.clone(),
        };
        match serde_json::to_value(&entry) {
            Ok(value) => {
                if let Err(e) = cache.put(CACHE_KEY, value, now) {
                    debug!("Failed to cache release lookup: {e:#}");
                }
            }
            Err(e) => debug!("Failed to encode release lookup: {e}"),
        }

        Some(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesight_utils::cache::MemoryKvCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        reply: Result<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn ok(version: &'static str) -> Self {
            Self {
                reply: Ok(version),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("offline"),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ReleaseSource for FakeSource {
        async fn latest_version(&self) -> Result<String, UpdateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .map_err(|e| UpdateError::Transport(e.to_string()))
        }
    }

    #[tokio::test]
    async fn test_newer_release_produces_notice_and_is_cached() {
        let checker = UpdateChecker::new(FakeSource::ok("1.2.0"));
        let mut cache = MemoryKvCache::default();
        let now = Utc::now();

        let notice = checker.check(&mut cache, "1.0.0", now).await;
        assert_eq!(
            notice,
            Some(UpdateNotice {
                current_version: "1.0.0".to_string(),
                latest_version: "1.2.0".to_string(),
            })
        );
        assert!(cache.get(CACHE_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_source() {
        let checker = UpdateChecker::new(FakeSource::ok("9.9.9"));
        let mut cache = MemoryKvCache::default();
        let now = Utc::now();
        cache
            .put(
                CACHE_KEY,
                serde_json::json!({"latest_version": "1.0.0"}),
                now - Duration::hours(1),
            )
            .unwrap();

        assert_eq!(checker.check(&mut cache, "1.0.0", now).await, None);
        assert_eq!(checker.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_cache_queries_source_again() {
        let checker = UpdateChecker::new(FakeSource::ok("1.1.0"));
        let mut cache = MemoryKvCache::default();
        let now = Utc::now();
        cache
            .put(
                CACHE_KEY,
                serde_json::json!({"latest_version": "1.0.0"}),
                now - Duration::hours(25),
            )
            .unwrap();

        assert!(checker.check(&mut cache, "1.0.0", now).await.is_some());
        assert_eq!(checker.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_source_failure_is_silent() {
        let checker = UpdateChecker::new(FakeSource::failing());
        let mut cache = MemoryKvCache::default();

        assert_eq!(checker.check(&mut cache, "1.0.0", Utc::now()).await, None);
        assert!(cache.get(CACHE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_notice_message_names_both_versions() {
        let notice = UpdateNotice {
            current_version: "1.0.0".to_string(),
            latest_version: "1.0.1".to_string(),
        };
        assert!(notice.message().contains("1.0.1"));
        assert!(notice.message().contains("current: 1.0.0"));
    }
}
