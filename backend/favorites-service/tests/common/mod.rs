#![allow(dead_code)]

use async_trait::async_trait;
use cache_store::{CacheStore, MemoryStore};
use favorites_service::config::TokenSecrets;
use favorites_service::db::FavoritesRepository;
use favorites_service::models::{MovieDetails, MovieSearchResults};
use favorites_service::security::TokenService;
use favorites_service::services::{FavoritesService, MovieCache, MovieCatalog};
use favorites_service::CatalogError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

pub fn secrets() -> TokenSecrets {
    TokenSecrets::new(
        "integration-access-secret-0123456789abcdef".to_string(),
        "integration-refresh-secret-0123456789abcdef".to_string(),
    )
    .unwrap()
}

pub fn movie(id: i64) -> MovieDetails {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "title": format!("Movie {}", id),
        "genres": [{"id": 18, "name": "Drama"}]
    }))
    .unwrap()
}

#[derive(Default)]
pub struct Favorites {
    rows: Mutex<HashMap<i64, Vec<i64>>>,
}

#[async_trait]
impl FavoritesRepository for Favorites {
    async fn list_favorite_ids(&self, user_id: i64) -> anyhow::Result<Vec<i64>> {
        Ok(self.rows.lock().await.get(&user_id).cloned().unwrap_or_default())
    }

    async fn add_favorite(&self, user_id: i64, movie_id: i64) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().await;
        let list = rows.entry(user_id).or_default();
        if !list.contains(&movie_id) {
            list.push(movie_id);
        }
        Ok(())
    }

    async fn remove_favorite(&self, user_id: i64, movie_id: i64) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().await;
        let list = rows.entry(user_id).or_default();
        let before = list.len();
        list.retain(|id| *id != movie_id);
        Ok(before != list.len())
    }
}

#[derive(Default)]
pub struct Catalog {
    pub fetched: Mutex<Vec<i64>>,
}

#[async_trait]
impl MovieCatalog for Catalog {
    async fn search_movies(&self, _query: &str, page: u32) -> Result<MovieSearchResults, CatalogError> {
        Ok(MovieSearchResults {
            page,
            total_pages: 0,
            total_results: 0,
            results: Vec::new(),
        })
    }

    async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, CatalogError> {
        self.fetched.lock().await.push(movie_id);
        if movie_id == 404 {
            return Err(CatalogError::NotFound(movie_id));
        }
        Ok(movie(movie_id))
    }
}

pub struct Harness {
    pub store: MemoryStore,
    pub repository: Arc<Favorites>,
    pub catalog: Arc<Catalog>,
    pub tokens: Arc<TokenService>,
    pub favorites: Arc<FavoritesService>,
}

pub fn harness() -> Harness {
    let store = MemoryStore::new();
    let shared: Arc<dyn CacheStore> = Arc::new(store.clone());
    let repository = Arc::new(Favorites::default());
    let catalog = Arc::new(Catalog::default());

    let tokens = Arc::new(TokenService::new(
        shared.clone(),
        &secrets(),
        Duration::from_secs(15 * 60),
        Duration::from_secs(7 * 24 * 3600),
    ));
    let favorites = Arc::new(FavoritesService::new(
        repository.clone(),
        MovieCache::new(shared, CACHE_TTL),
        catalog.clone(),
        Duration::from_secs(2),
        4,
    ));

    Harness {
        store,
        repository,
        catalog,
        tokens,
        favorites,
    }
}
