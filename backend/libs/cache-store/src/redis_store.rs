//! Redis-backed store.

use crate::{ttl_millis, CacheMetrics, CacheStore, StoreError, StoreResult};
use redis_utils::{with_timeout, SharedConnectionManager};
use std::time::Duration;
use tracing::{debug, warn};

/// Redis implementation of [`CacheStore`]. Every command is bounded by `command_timeout`.
#[derive(Clone)]
pub struct RedisStore {
    redis: SharedConnectionManager,
    command_timeout: Duration,
    metrics: CacheMetrics,
}

impl RedisStore {
    pub fn new(redis: SharedConnectionManager, command_timeout: Duration) -> Self {
        Self {
            redis,
            command_timeout,
            metrics: CacheMetrics::new(),
        }
    }

    fn record_failure(&self, key: &str, op: &str, err: StoreError) -> StoreError {
        warn!(key = %key, op = op, error = %err, "Redis command failed");
        self.metrics.record_error(key, err.kind());
        err
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.redis.lock().await.clone();
        let value: Option<String> = with_timeout(self.command_timeout, async {
            redis::cmd("GET").arg(key).query_async(&mut conn).await
        })
        .await
        .map_err(|e| self.record_failure(key, "get", e.into()))?;

        match value {
            Some(v) => {
                debug!(key = %key, "Store hit");
                self.metrics.record_hit(key);
                Ok(Some(v))
            }
            None => {
                debug!(key = %key, "Store miss");
                self.metrics.record_miss(key);
                Ok(None)
            }
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let ttl_ms = ttl_millis(ttl)?;

        let mut conn = self.redis.lock().await.clone();
        with_timeout(self.command_timeout, async {
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("PX")
                .arg(ttl_ms)
                .query_async::<_, ()>(&mut conn)
                .await
        })
        .await
        .map_err(|e| self.record_failure(key, "set", e.into()))?;

        debug!(key = %key, ttl_ms = ttl_ms, "Store set");
        self.metrics.record_write(key);
        Ok(())
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.redis.lock().await.clone();
        let removed: i64 = with_timeout(self.command_timeout, async {
            redis::cmd("DEL").arg(key).query_async(&mut conn).await
        })
        .await
        .map_err(|e| self.record_failure(key, "del", e.into()))?;

        debug!(key = %key, removed = removed, "Store delete");
        self.metrics.record_invalidation(key);
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.redis.lock().await.clone();
        let count: i64 = with_timeout(self.command_timeout, async {
            redis::cmd("EXISTS").arg(key).query_async(&mut conn).await
        })
        .await
        .map_err(|e| self.record_failure(key, "exists", e.into()))?;
        Ok(count > 0)
    }
}
