//! Redis connection bootstrap shared by the favorites backend.
//!
//! The service keeps exactly one [`ConnectionManager`] per process. It is
//! cheap to clone and multiplexes commands, so callers clone it out of the
//! shared handle instead of holding the lock across an await point.

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::{Client, IntoConnectionInfo};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Shared Redis connection manager guarded by a Tokio mutex.
pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

/// Error returned by [`with_timeout`].
#[derive(Debug, thiserror::Error)]
pub enum TimeoutError<E> {
    /// The deadline passed before the call completed.
    #[error("timed out after {0:?}")]
    Elapsed(Duration),
    /// The call itself failed.
    #[error("{0}")]
    Inner(E),
}

/// Bound an async call by `limit`.
pub async fn with_timeout<F, T, E>(limit: Duration, fut: F) -> Result<T, TimeoutError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(TimeoutError::Inner(e)),
        Err(_) => Err(TimeoutError::Elapsed(limit)),
    }
}

/// Process-wide Redis handle.
pub struct RedisPool {
    manager: SharedConnectionManager,
    command_timeout: Duration,
}

impl RedisPool {
    /// Open the connection and verify it with a `PING`.
    pub async fn connect(
        redis_url: &str,
        connect_timeout: Duration,
        command_timeout: Duration,
    ) -> Result<Self> {
        let info = redis_url
            .into_connection_info()
            .context("failed to parse REDIS_URL connection string")?;
        let client = Client::open(info).context("failed to construct Redis client")?;

        let manager = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .context("timed out connecting to Redis")?
            .context("failed to initialize Redis connection manager")?;

        let pool = Self {
            manager: Arc::new(Mutex::new(manager)),
            command_timeout,
        };
        pool.ping().await.context("Redis did not answer PING")?;

        info!(command_timeout_ms = command_timeout.as_millis() as u64, "Redis connection established");
        Ok(pool)
    }

    pub fn manager(&self) -> SharedConnectionManager {
        self.manager.clone()
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// Liveness check run once by [`RedisPool::connect`].
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.lock().await.clone();
        let reply: String = with_timeout(self.command_timeout, async {
            redis::cmd("PING").query_async(&mut conn).await
        })
        .await
        .map_err(|e: TimeoutError<redis::RedisError>| {
            warn!(error = %e, "Redis ping failed");
            anyhow::anyhow!(e.to_string())
        })?;

        if reply != "PONG" {
            anyhow::bail!("unexpected PING reply: {}", reply);
        }
        Ok(())
    }
}
