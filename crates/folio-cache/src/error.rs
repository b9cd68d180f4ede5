use thiserror::Error;

/// Errors raised while talking to the remote cache tier.
///
/// These never cross the crate's public read/write operations: the
/// coordinator catches them at the tier boundary, logs, and degrades to
/// a cache miss. The only error class a caller of [`CacheService`] can
/// observe is the one produced by its own fallback/update operation.
///
/// [`CacheService`]: crate::service::CacheService
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("Redis command error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Remote cache operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Cache payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    /// Check if this error is a connectivity problem (pool checkout,
    /// timeout) as opposed to a protocol/payload problem.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Pool(_) | Self::Timeout(_))
    }
}

/// Convenience result type for remote-tier operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_timeout_error_display() {
        let err = CacheError::Timeout(Duration::from_millis(250));
        assert!(err.to_string().contains("timed out"));
        assert!(err.is_connectivity());
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("{ invalid").unwrap_err();
        let err: CacheError = json_err.into();
        assert!(matches!(err, CacheError::Serialization(_)));
        assert!(!err.is_connectivity());
    }
}
