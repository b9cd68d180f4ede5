//! Local (L1) cache tier: in-process, size-bounded, per-entry TTL.
//!
//! The entry count is bounded by moka's capacity-based eviction; TTLs
//! vary per call, so expiry is enforced by filtering on read rather
//! than by a cache-wide time-to-live.

use moka::future::Cache;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cached entry with TTL support.
///
/// The payload is wrapped in `Arc` so cache hits clone a pointer, not
/// the serialized record.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub data: Arc<Vec<u8>>,
    pub cached_at: Instant,
    pub ttl: Duration,
}

impl CachedEntry {
    pub fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data: Arc::new(data),
            cached_at: Instant::now(),
            ttl,
        }
    }

    /// Check if this entry has expired.
    pub fn is_expired(&self) -> bool {
        self.cached_at.elapsed() > self.ttl
    }
}

/// In-process cache tier.
///
/// None of these operations can fail: absence is `None`, never an
/// error. Safe for concurrent use across async tasks.
///
/// Capacity eviction uses moka's TinyLFU policy, an approximation of
/// LRU: recently and frequently used entries are retained, but strict
/// recency order is not guaranteed.
#[derive(Clone)]
pub struct LocalCache {
    cache: Cache<String, CachedEntry>,
}

impl LocalCache {
    /// Create a local cache bounded to `max_entries`.
    pub fn new(max_entries: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    /// Get a value if present and not expired.
    ///
    /// Expired entries are removed on observation.
    pub async fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        match self.cache.get(key).await {
            Some(entry) if !entry.is_expired() => Some(Arc::clone(&entry.data)),
            Some(_) => {
                self.cache.invalidate(key).await;
                None
            }
            None => None,
        }
    }

    /// Insert or replace the entry for `key`.
    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        self.cache
            .insert(key.to_string(), CachedEntry::new(value, ttl))
            .await;
    }

    /// Remove the entry if present; no-op otherwise.
    pub async fn delete(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    /// Number of entries currently resident (approximate under load).
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = LocalCache::new(100);
        cache
            .set("hero_sections:alice", b"payload".to_vec(), Duration::from_secs(60))
            .await;

        let hit = cache.get("hero_sections:alice").await;
        assert_eq!(hit.as_deref().map(|v| v.as_slice()), Some(b"payload".as_slice()));
    }

    #[tokio::test]
    async fn test_miss_is_none() {
        let cache = LocalCache::new(100);
        assert!(cache.get("projects:nobody").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed_on_read() {
        let cache = LocalCache::new(100);
        cache
            .set("projects:alice", b"stale".to_vec(), Duration::from_millis(5))
            .await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get("projects:alice").await.is_none());
        // A second read stays a miss (entry was dropped, not just filtered).
        assert!(cache.get("projects:alice").await.is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let cache = LocalCache::new(100);
        cache
            .set("layout_styles:alice", b"v1".to_vec(), Duration::from_secs(60))
            .await;

        cache.delete("layout_styles:alice").await;
        assert!(cache.get("layout_styles:alice").await.is_none());
        // Deleting an absent key is a no-op.
        cache.delete("layout_styles:alice").await;
    }

    #[tokio::test]
    async fn test_replace_overwrites() {
        let cache = LocalCache::new(100);
        cache
            .set("users:alice", b"old".to_vec(), Duration::from_secs(60))
            .await;
        cache
            .set("users:alice", b"new".to_vec(), Duration::from_secs(60))
            .await;

        let hit = cache.get("users:alice").await.unwrap();
        assert_eq!(hit.as_slice(), b"new");
    }
}
