//! Store error types
//!
//! A missing key is never an error: it is `Ok(None)` from
//! [`CacheStore::get`](crate::CacheStore::get).

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store command timed out after {0:?}")]
    Timeout(Duration),

    #[error("TTL must be greater than zero")]
    InvalidTtl,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<redis_utils::TimeoutError<redis::RedisError>> for StoreError {
    fn from(err: redis_utils::TimeoutError<redis::RedisError>) -> Self {
        match err {
            redis_utils::TimeoutError::Elapsed(d) => StoreError::Timeout(d),
            redis_utils::TimeoutError::Inner(e) => StoreError::Redis(e),
        }
    }
}

impl StoreError {
    /// Short label used for the `error_type` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Redis(_) => "redis",
            StoreError::Timeout(_) => "timeout",
            StoreError::InvalidTtl => "invalid_ttl",
            StoreError::Unavailable(_) => "unavailable",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
