//! Typed view of the movie detail cache over a [`CacheStore`].

use crate::models::{CachedMovie, MovieDetails};
use cache_store::{CacheKey, CacheStore, StoreError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct MovieCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl MovieCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a movie. `Ok(None)` covers both an absent key and an entry that
    /// cannot be used (bad JSON or a different movie id); the latter is
    /// overwritten by the next [`MovieCache::put`].
    pub async fn get(&self, movie_id: i64) -> Result<Option<MovieDetails>, StoreError> {
        let key = CacheKey::movie(movie_id);
        let Some(raw) = self.store.get(&key).await? else {
            debug!(movie_id = movie_id, "Movie cache miss");
            return Ok(None);
        };

        match serde_json::from_str::<CachedMovie>(&raw) {
            Ok(entry) if entry.movie.id == movie_id => {
                debug!(movie_id = movie_id, cached_at = %entry.cached_at, "Movie cache hit");
                Ok(Some(entry.movie))
            }
            Ok(entry) => {
                warn!(movie_id = movie_id, stored_id = entry.movie.id, "Cache entry holds another movie");
                Ok(None)
            }
            Err(e) => {
                warn!(movie_id = movie_id, error = %e, "Unreadable cache entry");
                Ok(None)
            }
        }
    }

    /// Store a movie with the configured TTL, stamped with the current time.
    pub async fn put(&self, movie: &MovieDetails) -> Result<(), StoreError> {
        let entry = CachedMovie {
            movie: movie.clone(),
            cached_at: Utc::now(),
        };
        let value = serde_json::to_string(&entry)
            .map_err(|e| StoreError::Unavailable(format!("serialize movie {}: {}", movie.id, e)))?;

        self.store
            .set_ex(&CacheKey::movie(movie.id), &value, self.ttl)
            .await?;
        debug!(movie_id = movie.id, "Movie cached");
        Ok(())
    }
}
