//! Fakes shared by the unit tests.

use crate::config::TokenSecrets;
use crate::db::{FavoritesRepository, UnknownUser};
use crate::error::CatalogError;
use crate::models::{MovieDetails, MovieSearchResults, MovieSummary};
use crate::services::MovieCatalog;
use anyhow::anyhow;
use cache_store::{CacheStore, MemoryStore, StoreError, StoreResult};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

pub const ACCESS_SECRET: &str = "access-secret-for-tests-0123456789abcdef";
pub const REFRESH_SECRET: &str = "refresh-secret-for-tests-0123456789abcdef";

pub fn test_secrets() -> TokenSecrets {
    TokenSecrets::new(ACCESS_SECRET.to_string(), REFRESH_SECRET.to_string())
        .expect("test secrets are valid")
}

pub fn movie(id: i64) -> MovieDetails {
    MovieDetails {
        id,
        title: format!("Movie {}", id),
        original_title: format!("Movie {}", id),
        overview: Some("overview".to_string()),
        release_date: Some("1999-03-31".to_string()),
        adult: false,
        poster_path: None,
        runtime: Some(120),
        popularity: Some(1.5),
        vote_average: Some(7.0),
        vote_count: Some(10),
        genres: Vec::new(),
    }
}

/// Store that fails on demand. Operations that do not fail go to `inner`.
pub struct FaultyStore {
    inner: MemoryStore,
    fail_reads: bool,
    writes_left: Option<AtomicUsize>,
}

impl FaultyStore {
    /// Every operation fails.
    pub fn down() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_reads: true,
            writes_left: Some(AtomicUsize::new(0)),
        }
    }

    pub fn reads_fail(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_reads: true,
            writes_left: None,
        }
    }

    /// Allow `n` successful writes, then fail every write.
    pub fn writes_fail_after(inner: MemoryStore, n: usize) -> Self {
        Self {
            inner,
            fail_reads: false,
            writes_left: Some(AtomicUsize::new(n)),
        }
    }

    fn outage() -> StoreError {
        StoreError::Unavailable("connection refused".to_string())
    }
}

#[async_trait::async_trait]
impl CacheStore for FaultyStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if self.fail_reads {
            return Err(Self::outage());
        }
        self.inner.get(key).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        if let Some(left) = &self.writes_left {
            let allowed = left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if !allowed {
                return Err(Self::outage());
            }
        }
        self.inner.set_ex(key, value, ttl).await
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        if self.fail_reads {
            return Err(Self::outage());
        }
        self.inner.del(key).await
    }
}

#[derive(Default)]
struct FavoritesState {
    rows: HashMap<i64, Vec<i64>>,
    deleted_users: HashSet<i64>,
    insert_attempts: usize,
    fail_inserts: bool,
}

/// Favorites table kept in memory, insertion ordered.
#[derive(Default)]
pub struct InMemoryFavorites {
    state: Mutex<FavoritesState>,
}

impl InMemoryFavorites {
    pub async fn seed(&self, user_id: i64, movie_ids: &[i64]) {
        self.state
            .lock()
            .await
            .rows
            .insert(user_id, movie_ids.to_vec());
    }

    pub async fn insert_attempts(&self) -> usize {
        self.state.lock().await.insert_attempts
    }

    /// Drop the user's rows and reject later inserts for them.
    pub async fn delete_user(&self, user_id: i64) {
        let mut state = self.state.lock().await;
        state.rows.remove(&user_id);
        state.deleted_users.insert(user_id);
    }

    pub async fn fail_inserts(&self) {
        self.state.lock().await.fail_inserts = true;
    }
}

#[async_trait::async_trait]
impl FavoritesRepository for InMemoryFavorites {
    async fn list_favorite_ids(&self, user_id: i64) -> anyhow::Result<Vec<i64>> {
        Ok(self
            .state
            .lock()
            .await
            .rows
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_favorite(&self, user_id: i64, movie_id: i64) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        state.insert_attempts += 1;
        if state.fail_inserts {
            return Err(anyhow!("insert failed"));
        }
        if state.deleted_users.contains(&user_id) {
            return Err(UnknownUser(user_id).into());
        }
        let list = state.rows.entry(user_id).or_default();
        if !list.contains(&movie_id) {
            list.push(movie_id);
        }
        Ok(())
    }

    async fn remove_favorite(&self, user_id: i64, movie_id: i64) -> anyhow::Result<bool> {
        let mut state = self.state.lock().await;
        let Some(list) = state.rows.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|id| *id != movie_id);
        Ok(list.len() != before)
    }
}

/// Catalog that serves [`movie`] fixtures and records every detail fetch.
#[derive(Default)]
pub struct RecordingCatalog {
    calls: Mutex<Vec<i64>>,
    failing: Mutex<HashSet<i64>>,
    delay: Option<Duration>,
}

impl RecordingCatalog {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub async fn fail_on(&self, movie_id: i64) {
        self.failing.lock().await.insert(movie_id);
    }

    /// Movie ids fetched so far, in call order.
    pub async fn calls(&self) -> Vec<i64> {
        self.calls.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl MovieCatalog for RecordingCatalog {
    async fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> Result<MovieSearchResults, CatalogError> {
        let hit = movie(1);
        Ok(MovieSearchResults {
            page,
            total_pages: 1,
            total_results: 1,
            results: vec![MovieSummary {
                id: hit.id,
                title: format!("{} {}", hit.title, query),
                original_title: hit.original_title,
                overview: hit.overview,
                release_date: hit.release_date,
                adult: hit.adult,
                poster_path: hit.poster_path,
                popularity: hit.popularity,
                vote_average: hit.vote_average,
            }],
        })
    }

    async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, CatalogError> {
        self.calls.lock().await.push(movie_id);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().await.contains(&movie_id) {
            return Err(CatalogError::Status(503));
        }
        Ok(movie(movie_id))
    }
}
