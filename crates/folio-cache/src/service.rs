//! Read-through cache coordinator.
//!
//! ## Lookup Order
//!
//! ```text
//! fetch_through → L1 (local) → L2 (Redis) → fallback (DB)
//! ```
//!
//! A value found in L2 is promoted to L1; a value computed by the
//! fallback is written to L2 then L1. Cache-tier failures are logged
//! and degraded to misses; the only error that leaves this module is
//! the one raised by the caller's own fallback/update operation.
//!
//! Concurrent misses on the same key are not deduplicated: fallbacks in
//! this system are cheap idempotent reads, so redundant execution costs
//! a little efficiency, not correctness.

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::local::LocalCache;
use crate::remote::RemoteTier;

/// Per-call overrides for [`CacheService::fetch_through`].
///
/// Unset TTLs fall back to the service-wide [`CacheConfig`] defaults
/// (300 s remote, 300 000 ms local).
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Remote (L2) TTL for values written by this call.
    pub remote_ttl: Option<Duration>,
    /// Local (L1) TTL for values written by this call.
    pub local_ttl: Option<Duration>,
    /// Skip both tiers and always invoke the fallback. The result still
    /// repopulates both tiers. The escape hatch for callers that need
    /// strict read-after-write consistency.
    pub force_refresh: bool,
}

impl FetchOptions {
    /// Options that bypass both tiers.
    pub fn force_refresh() -> Self {
        Self {
            force_refresh: true,
            ..Self::default()
        }
    }
}

/// Long-lived cache service: one instance per process, shared by every
/// action handler. An empty remote slot is the degraded local-only mode
/// used when Redis is disabled or unreachable at startup.
///
/// Clones share one remote-tier slot, so [`shutdown`](Self::shutdown)
/// through any handle detaches the tier for all of them.
#[derive(Clone)]
pub struct CacheService {
    local: LocalCache,
    remote: Arc<RwLock<Option<Arc<dyn RemoteTier>>>>,
    defaults: CacheConfig,
}

impl CacheService {
    /// Create a local-only service (no shared tier).
    pub fn local_only(defaults: CacheConfig) -> Self {
        Self {
            local: LocalCache::new(defaults.local_max_entries),
            remote: Arc::new(RwLock::new(None)),
            defaults,
        }
    }

    /// Create a service backed by a shared remote tier.
    pub fn with_remote(defaults: CacheConfig, remote: Arc<dyn RemoteTier>) -> Self {
        Self {
            local: LocalCache::new(defaults.local_max_entries),
            remote: Arc::new(RwLock::new(Some(remote))),
            defaults,
        }
    }

    /// Whether a remote tier is attached.
    pub fn has_remote(&self) -> bool {
        self.remote.read().is_some()
    }

    /// Detach the remote tier at process shutdown.
    ///
    /// The slot is shared across clones, so calling this on any handle
    /// detaches the tier for every handler. The connection pool closes
    /// once the last reference to the detached tier is dropped.
    pub fn shutdown(&self) {
        if self.remote.write().take().is_some() {
            tracing::info!("remote cache tier detached");
        }
    }

    /// Snapshot the remote tier without holding the slot lock across
    /// any await point.
    fn remote_tier(&self) -> Option<Arc<dyn RemoteTier>> {
        self.remote.read().clone()
    }

    /// Read `key` through the cache tiers.
    ///
    /// Consults L1, then L2 (promoting hits to L1), then invokes
    /// `fallback` and repopulates L2 then L1 with its result. Errors
    /// from `fallback` propagate unchanged; errors from either cache
    /// tier never do.
    pub async fn fetch_through<T, E, F, Fut>(
        &self,
        key: &str,
        fallback: F,
        options: FetchOptions,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let local_ttl = options.local_ttl.unwrap_or_else(|| self.defaults.local_ttl());
        let remote_ttl = options
            .remote_ttl
            .unwrap_or_else(|| self.defaults.remote_ttl());

        if !options.force_refresh {
            // 1. L1: the common path, no network I/O.
            if let Some(bytes) = self.local.get(key).await {
                match serde_json::from_slice::<T>(&bytes) {
                    Ok(value) => {
                        tracing::debug!(key = %key, "cache hit (L1)");
                        return Ok(value);
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "corrupt L1 entry, dropping");
                        self.local.delete(key).await;
                    }
                }
            }

            // 2. L2: remote errors are a miss, never the caller's problem.
            if let Some(remote) = self.remote_tier() {
                match remote.get(key).await {
                    Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
                        Ok(value) => {
                            tracing::debug!(key = %key, "cache hit (L2)");
                            self.local.set(key, bytes, local_ttl).await;
                            return Ok(value);
                        }
                        Err(e) => {
                            tracing::warn!(key = %key, error = %e, "corrupt L2 entry, dropping");
                            if let Err(e) = remote.delete(key).await {
                                tracing::warn!(key = %key, error = %e, "Redis DEL error");
                            }
                        }
                    },
                    Ok(None) => {
                        tracing::debug!(key = %key, "cache miss");
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Redis GET error, degrading to source");
                    }
                }
            }
        }

        // 3. Source of truth. Its error is the one class we propagate.
        let value = fallback().await?;

        // 4. Best-effort population; the value is already correct.
        self.populate(key, &value, remote_ttl, local_ttl).await;

        Ok(value)
    }

    /// Remove `key` from both tiers.
    ///
    /// The local removal always takes effect; a remote delete failure
    /// is logged and swallowed; the entry still expires via its TTL,
    /// so staleness stays bounded.
    pub async fn invalidate(&self, key: &str) {
        self.local.delete(key).await;
        if let Some(remote) = self.remote_tier() {
            match remote.delete(key).await {
                Ok(()) => tracing::debug!(key = %key, "cache invalidated (L1+L2)"),
                Err(e) => tracing::warn!(key = %key, error = %e, "Redis DEL error"),
            }
        } else {
            tracing::debug!(key = %key, "cache invalidated (L1)");
        }
    }

    /// Run a store write, then refresh the cache with its result.
    ///
    /// `update_op` runs first and its error propagates unchanged with
    /// no cache tier touched. On success the stale entry is invalidated
    /// and both tiers are repopulated with the fresh value, so the next
    /// read is a hit instead of a forced recompute.
    pub async fn update_and_cache<T, E, F, Fut>(&self, key: &str, update_op: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let value = update_op().await?;
        self.invalidate(key).await;
        self.populate(key, &value, self.defaults.remote_ttl(), self.defaults.local_ttl())
            .await;
        Ok(value)
    }

    /// Write a value to L2 then L1, best-effort.
    async fn populate<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        remote_ttl: Duration,
        local_ttl: Duration,
    ) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to serialize value for cache");
                return;
            }
        };

        if let Some(remote) = self.remote_tier() {
            match remote.set(key, &bytes, remote_ttl).await {
                Ok(()) => {
                    tracing::debug!(key = %key, ttl_secs = remote_ttl.as_secs(), "cache set (L2)");
                }
                Err(e) => tracing::warn!(key = %key, error = %e, "Redis SET error"),
            }
        }
        self.local.set(key, bytes, local_ttl).await;
    }

    #[cfg(test)]
    pub(crate) fn local(&self) -> &LocalCache {
        &self.local
    }
}
