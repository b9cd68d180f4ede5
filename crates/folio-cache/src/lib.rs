//! Two-tier read-through caching for the Folio portfolio builder.
//!
//! ## Architecture
//!
//! - **L1 (local)**: in-process, size-bounded, microsecond latency,
//!   per-instance
//! - **L2 (Redis)**: network, millisecond latency, shared across
//!   instances
//!
//! ## Cache Hierarchy
//!
//! ```text
//! fetch_through → L1 (local) → L2 (Redis) → source of truth (DB)
//! ```
//!
//! ## Graceful Degradation
//!
//! If Redis is unavailable or disabled, the service runs in L1-only
//! mode. The remote tier is an optimization: its failures are logged
//! and absorbed, never surfaced to the action handlers. The only error
//! a caller can observe from [`CacheService::fetch_through`] or
//! [`CacheService::update_and_cache`] is the one raised by its own
//! store operation.

pub mod config;
pub mod error;
pub mod keys;
pub mod local;
pub mod remote;
pub mod service;

pub use config::{CacheConfig, RedisConfig};
pub use error::{CacheError, CacheResult};
pub use keys::CacheKey;
pub use local::{CachedEntry, LocalCache};
pub use remote::{RedisRemoteCache, RemoteTier};
pub use service::{CacheService, FetchOptions};

use std::sync::Arc;

/// Create a cache service based on configuration.
///
/// ## Cache Modes
///
/// - **Redis disabled**: L1-only service
/// - **Redis enabled**: attempts to connect, falls back to L1-only on
///   failure so the application can start even with Redis down
pub async fn create_cache_service(redis: &RedisConfig, cache: &CacheConfig) -> CacheService {
    if !redis.enabled {
        tracing::info!("Redis disabled, using local cache only");
        return CacheService::local_only(cache.clone());
    }

    tracing::info!(url = %redis.url, "Connecting to Redis");

    let mut redis_config = deadpool_redis::Config::from_url(&redis.url);
    if let Some(ref mut pool_config) = redis_config.pool {
        pool_config.max_size = redis.pool_size;
        pool_config.timeouts.wait = Some(redis.timeout());
        pool_config.timeouts.create = Some(redis.timeout());
        pool_config.timeouts.recycle = Some(redis.timeout());
    }

    let pool = match redis_config.create_pool(Some(deadpool_redis::Runtime::Tokio1)) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to create Redis pool. Falling back to local cache."
            );
            return CacheService::local_only(cache.clone());
        }
    };

    // Test connection once; the pool itself stays lazy.
    match pool.get().await {
        Ok(_) => {
            tracing::info!("Connected to Redis");
            let remote = RedisRemoteCache::new(pool, redis.timeout(), redis.retry_attempts);
            CacheService::with_remote(cache.clone(), Arc::new(remote))
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to connect to Redis. Falling back to local cache."
            );
            CacheService::local_only(cache.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_redis_yields_local_only() {
        let service = create_cache_service(&RedisConfig::default(), &CacheConfig::default()).await;
        assert!(!service.has_remote());
    }

    #[tokio::test]
    async fn test_unreachable_redis_falls_back_to_local() {
        let redis = RedisConfig {
            enabled: true,
            url: "redis://127.0.0.1:1".to_string(),
            timeout_ms: 50,
            ..Default::default()
        };
        let service = create_cache_service(&redis, &CacheConfig::default()).await;
        assert!(!service.has_remote());
    }
}
