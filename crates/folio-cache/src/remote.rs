//! Remote (L2) cache tier: Redis-backed, shared across instances.
//!
//! The remote tier is an optimization, never a correctness dependency:
//! every failure here must degrade to "go to the source of truth".
//! Each call carries its own timeout and a small retry allowance;
//! there is no unbounded retry loop that could pin a request task.

use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use std::time::Duration;

use crate::error::{CacheError, CacheResult};

/// Abstraction over the shared cache tier.
///
/// Lets the coordinator run against Redis in production and against
/// in-memory doubles in tests without changing consumer code.
#[async_trait]
pub trait RemoteTier: Send + Sync {
    /// Fetch the raw payload for `key`, `None` if absent.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store `value` under `key` with the given TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()>;

    /// Remove `key`; absent keys are not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;
}

/// Redis-backed remote tier over a lazy `deadpool_redis` pool.
///
/// Connections are checked out on first use, not at construction, so
/// building this with Redis down is fine: calls will fail (and be
/// degraded by the coordinator) until it comes back.
pub struct RedisRemoteCache {
    pool: Pool,
    timeout: Duration,
    retry_attempts: u32,
}

impl RedisRemoteCache {
    pub fn new(pool: Pool, timeout: Duration, retry_attempts: u32) -> Self {
        Self {
            pool,
            timeout,
            retry_attempts: retry_attempts.max(1),
        }
    }

    async fn connection(&self) -> CacheResult<deadpool_redis::Connection> {
        tokio::time::timeout(self.timeout, self.pool.get())
            .await
            .map_err(|_| CacheError::Timeout(self.timeout))?
            .map_err(CacheError::from)
    }

    async fn get_once(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        tokio::time::timeout(self.timeout, conn.get::<_, Option<Vec<u8>>>(key))
            .await
            .map_err(|_| CacheError::Timeout(self.timeout))?
            .map_err(CacheError::from)
    }

    async fn set_once(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let ttl_secs = ttl.as_secs().max(1);
        tokio::time::timeout(self.timeout, conn.set_ex::<_, _, ()>(key, value, ttl_secs))
            .await
            .map_err(|_| CacheError::Timeout(self.timeout))?
            .map_err(CacheError::from)
    }

    async fn delete_once(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        tokio::time::timeout(self.timeout, conn.del::<_, ()>(key))
            .await
            .map_err(|_| CacheError::Timeout(self.timeout))?
            .map_err(CacheError::from)
    }
}

const INITIAL_BACKOFF: Duration = Duration::from_millis(50);

#[async_trait]
impl RemoteTier for RedisRemoteCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut backoff = INITIAL_BACKOFF;
        let mut last_err = CacheError::Timeout(self.timeout);
        for attempt in 0..self.retry_attempts {
            if attempt > 0 {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            match self.get_once(key).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::debug!(key = %key, attempt, error = %e, "Redis GET attempt failed");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let mut backoff = INITIAL_BACKOFF;
        let mut last_err = CacheError::Timeout(self.timeout);
        for attempt in 0..self.retry_attempts {
            if attempt > 0 {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            match self.set_once(key, value, ttl).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::debug!(key = %key, attempt, error = %e, "Redis SET attempt failed");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut backoff = INITIAL_BACKOFF;
        let mut last_err = CacheError::Timeout(self.timeout);
        for attempt in 0..self.retry_attempts {
            if attempt > 0 {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            match self.delete_once(key).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::debug!(key = %key, attempt, error = %e, "Redis DEL attempt failed");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}
