//! In-process store with the same TTL semantics as Redis.
//!
//! Used by tests and by local runs without a Redis instance. Expired entries
//! read as absent and are purged lazily on access.

use crate::{ttl_millis, CacheMetrics, CacheStore, StoreResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    metrics: CacheMetrics,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining lifetime of a live key.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        entries
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.expires_at - now)
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    self.metrics.record_hit(key);
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
                None => {
                    self.metrics.record_miss(key);
                    return Ok(None);
                }
            }
        }

        // expired: purge
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
        }
        self.metrics.record_miss(key);
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let ttl = Duration::from_millis(ttl_millis(ttl)?);
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        self.metrics.record_write(key);
        Ok(())
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        let now = Instant::now();
        let removed = self.entries.write().await.remove(key);
        self.metrics.record_invalidation(key);
        Ok(removed.is_some_and(|e| e.expires_at > now))
    }
}
