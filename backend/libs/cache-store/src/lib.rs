//! Volatile key-value store adapter
//!
//! One interface, two jobs:
//! - session ledger: `session_id -> user_id`, TTL = token lifetime
//! - movie detail cache: `movie:{id} -> JSON`, TTL = configured cache lifetime
//!
//! The interface keeps "key absent" (`Ok(None)`) apart from transport
//! failures (`Err`). Callers rely on that distinction: an outage must never be
//! read as a cache miss or a revoked session.

mod error;
mod keys;
mod memory;
mod metrics;
mod redis_store;

pub use error::{StoreError, StoreResult};
pub use keys::{CacheKey, MOVIE_PREFIX};
pub use memory::MemoryStore;
pub use metrics::CacheMetrics;
pub use redis_store::RedisStore;

use std::time::Duration;

/// Core store operations. Object safe so services can hold `Arc<dyn CacheStore>`.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a key. `Ok(None)` means the key is absent or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a key with a time-to-live. A zero TTL is rejected.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Delete a key, returning whether it existed.
    async fn del(&self, key: &str) -> StoreResult<bool>;

    /// Check if key exists
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Millisecond TTL used on the wire, rounded up so sub-millisecond TTLs are not lost.
pub(crate) fn ttl_millis(ttl: Duration) -> StoreResult<u64> {
    if ttl.is_zero() {
        return Err(StoreError::InvalidTtl);
    }
    let millis = ttl.as_millis();
    let rounded = if Duration::from_millis(millis as u64) < ttl {
        millis + 1
    } else {
        millis
    };
    Ok(rounded.min(u64::MAX as u128) as u64)
}
