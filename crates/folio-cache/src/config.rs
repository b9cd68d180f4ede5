use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Redis configuration for the remote (L2) cache tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Enable Redis (gracefully degrades without it)
    /// Default: false (disabled for single-instance deployments)
    #[serde(default = "default_redis_enabled")]
    pub enabled: bool,

    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Per-call timeout in milliseconds (pool checkout and each command)
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,

    /// Attempts per call before giving up on the remote tier for that call
    #[serde(default = "default_redis_retry_attempts")]
    pub retry_attempts: u32,
}

fn default_redis_enabled() -> bool {
    false
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    1000
}

fn default_redis_retry_attempts() -> u32 {
    2
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: default_redis_enabled(),
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
            retry_attempts: default_redis_retry_attempts(),
        }
    }
}

impl RedisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Cache tier defaults. Per-call overrides go through
/// [`FetchOptions`](crate::service::FetchOptions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Remote (L2) TTL in seconds
    #[serde(default = "default_remote_ttl_secs")]
    pub remote_ttl_secs: u64,

    /// Local (L1) TTL in milliseconds
    #[serde(default = "default_local_ttl_ms")]
    pub local_ttl_ms: u64,

    /// Local (L1) cache max entries
    #[serde(default = "default_local_max_entries")]
    pub local_max_entries: u64,
}

fn default_remote_ttl_secs() -> u64 {
    300
}

fn default_local_ttl_ms() -> u64 {
    300_000
}

fn default_local_max_entries() -> u64 {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            remote_ttl_secs: default_remote_ttl_secs(),
            local_ttl_ms: default_local_ttl_ms(),
            local_max_entries: default_local_max_entries(),
        }
    }
}

impl CacheConfig {
    pub fn remote_ttl(&self) -> Duration {
        Duration::from_secs(self.remote_ttl_secs)
    }

    pub fn local_ttl(&self) -> Duration {
        Duration::from_millis(self.local_ttl_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.remote_ttl_secs == 0 {
            return Err("cache.remote_ttl_secs must be > 0".into());
        }
        if self.local_ttl_ms == 0 {
            return Err("cache.local_ttl_ms must be > 0".into());
        }
        if self.local_max_entries == 0 {
            return Err("cache.local_max_entries must be > 0".into());
        }
        Ok(())
    }
}

impl RedisConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.url.is_empty() {
            return Err("redis.enabled=true requires redis.url".into());
        }
        if self.timeout_ms == 0 {
            return Err("redis.timeout_ms must be > 0".into());
        }
        if self.pool_size == 0 {
            return Err("redis.pool_size must be > 0".into());
        }
        if self.retry_attempts == 0 {
            return Err("redis.retry_attempts must be > 0".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let redis = RedisConfig::default();
        assert!(!redis.enabled);
        assert_eq!(redis.url, "redis://localhost:6379");
        assert!(redis.validate().is_ok());

        let cache = CacheConfig::default();
        assert_eq!(cache.remote_ttl(), Duration::from_secs(300));
        assert_eq!(cache.local_ttl(), Duration::from_millis(300_000));
        assert!(cache.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let cache = CacheConfig {
            remote_ttl_secs: 0,
            ..Default::default()
        };
        assert!(cache.validate().is_err());

        let redis = RedisConfig {
            enabled: true,
            url: String::new(),
            ..Default::default()
        };
        assert!(redis.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_partial_fields() {
        let redis: RedisConfig =
            serde_json::from_str(r#"{"enabled": true, "url": "redis://cache:6379"}"#).unwrap();
        assert!(redis.enabled);
        assert_eq!(redis.url, "redis://cache:6379");
        assert_eq!(redis.pool_size, 10);
        assert_eq!(redis.retry_attempts, 2);
    }
}
