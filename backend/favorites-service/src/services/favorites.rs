//! Favorites reconciliation
//!
//! The durable store owns the list of favorite ids; the cache owns movie
//! details for a bounded time. `get_favorites` merges the two, repairing
//! cache misses from the catalog, and either returns every favorite with its
//! details or fails as a whole.

use super::catalog::MovieCatalog;
use super::movie_cache::MovieCache;
use crate::db::{FavoritesRepository, UnknownUser};
use crate::error::FavoritesError;
use crate::models::{FavoritesView, MovieDetails};
use futures::stream::{self, StreamExt};
use redis_utils::{with_timeout, TimeoutError};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct FavoritesService {
    repository: Arc<dyn FavoritesRepository>,
    cache: MovieCache,
    catalog: Arc<dyn MovieCatalog>,
    call_timeout: Duration,
    max_concurrency: usize,
}

impl FavoritesService {
    pub fn new(
        repository: Arc<dyn FavoritesRepository>,
        cache: MovieCache,
        catalog: Arc<dyn MovieCatalog>,
        call_timeout: Duration,
        max_concurrency: usize,
    ) -> Self {
        Self {
            repository,
            cache,
            catalog,
            call_timeout,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Every favorite of `user_id` with its details, in list order.
    pub async fn get_favorites(&self, user_id: i64) -> Result<FavoritesView, FavoritesError> {
        let movie_ids = bounded(self.call_timeout, self.repository.list_favorite_ids(user_id))
            .await
            .map_err(|e| {
                error!(user_id = user_id, error = %e, "Failed to list favorites");
                FavoritesError::Retrieval(e)
            })?;

        let mut seen = HashSet::with_capacity(movie_ids.len());
        let distinct: Vec<i64> = movie_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        // single probing pass
        let mut resolved: HashMap<i64, MovieDetails> = HashMap::with_capacity(distinct.len());
        let mut misses = Vec::new();
        for &movie_id in &distinct {
            let cached = bounded(self.call_timeout, self.cache.get(movie_id))
                .await
                .map_err(|e| {
                    error!(user_id = user_id, movie_id = movie_id, error = %e, "Movie cache probe failed");
                    FavoritesError::Retrieval(e)
                })?;
            match cached {
                Some(movie) => {
                    resolved.insert(movie_id, movie);
                }
                None => misses.push(movie_id),
            }
        }

        debug!(
            user_id = user_id,
            hits = resolved.len(),
            misses = misses.len(),
            "Favorites cache probe complete"
        );

        if !misses.is_empty() {
            let mut fetches = stream::iter(misses)
                .map(|movie_id| self.fetch_and_cache(movie_id))
                .buffer_unordered(self.max_concurrency);

            // the first failure drops the stream and with it the in-flight fetches
            while let Some(result) = fetches.next().await {
                let movie = result.map_err(|e| {
                    error!(user_id = user_id, error = %e, "Failed to repair movie cache");
                    FavoritesError::Retrieval(e)
                })?;
                resolved.insert(movie.id, movie);
            }
        }

        let mut movie_details = Vec::with_capacity(distinct.len());
        for movie_id in distinct {
            let movie = resolved.remove(&movie_id).ok_or_else(|| {
                FavoritesError::Retrieval(format!("movie {} was not resolved", movie_id))
            })?;
            movie_details.push(movie);
        }

        Ok(FavoritesView {
            user_id,
            movie_ids,
            movie_details,
        })
    }

    /// Make sure the movie is cached, then record the favorite.
    ///
    /// A cache or catalog failure stops before the durable insert. An insert
    /// failure after a successful cache write leaves the entry to its TTL.
    pub async fn add_favorite(&self, user_id: i64, movie_id: i64) -> Result<(), FavoritesError> {
        let cached = bounded(self.call_timeout, self.cache.get(movie_id))
            .await
            .map_err(|e| {
                error!(user_id = user_id, movie_id = movie_id, error = %e, "Movie cache probe failed");
                FavoritesError::Add(e)
            })?;

        if cached.is_none() {
            self.fetch_and_cache(movie_id).await.map_err(|e| {
                error!(user_id = user_id, movie_id = movie_id, error = %e, "Failed to populate movie cache");
                FavoritesError::Add(e)
            })?;
        }

        with_timeout(self.call_timeout, self.repository.add_favorite(user_id, movie_id))
            .await
            .map_err(|e| match e {
                TimeoutError::Inner(e) if e.is::<UnknownUser>() => {
                    warn!(user_id = user_id, movie_id = movie_id, "Favorite for a deleted user");
                    FavoritesError::UnknownUser(user_id)
                }
                e => {
                    error!(user_id = user_id, movie_id = movie_id, error = %e, "Failed to insert favorite");
                    FavoritesError::Add(e.to_string())
                }
            })?;

        info!(user_id = user_id, movie_id = movie_id, "Favorite added");
        Ok(())
    }

    /// Remove a favorite. The shared movie cache entry stays until its TTL.
    pub async fn remove_favorite(&self, user_id: i64, movie_id: i64) -> Result<bool, FavoritesError> {
        let removed = bounded(
            self.call_timeout,
            self.repository.remove_favorite(user_id, movie_id),
        )
        .await
        .map_err(|e| {
            error!(user_id = user_id, movie_id = movie_id, error = %e, "Failed to remove favorite");
            FavoritesError::Remove(e)
        })?;

        info!(user_id = user_id, movie_id = movie_id, removed = removed, "Favorite removed");
        Ok(removed)
    }

    async fn fetch_and_cache(&self, movie_id: i64) -> Result<MovieDetails, String> {
        let movie = bounded(self.call_timeout, self.catalog.movie_details(movie_id))
            .await
            .map_err(|e| format!("catalog fetch for movie {}: {}", movie_id, e))?;

        bounded(self.call_timeout, self.cache.put(&movie))
            .await
            .map_err(|e| format!("cache write for movie {}: {}", movie_id, e))?;

        Ok(movie)
    }
}

/// Run `fut` under a deadline; a timeout is reported like any other failure.
async fn bounded<F, T, E>(limit: Duration, fut: F) -> Result<T, String>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    with_timeout(limit, fut).await.map_err(|e| e.to_string())
}
