//! External movie catalog (TMDb v3 wire format)

use crate::error::CatalogError;
use crate::models::{MovieDetails, MovieSearchResults};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn search_movies(&self, query: &str, page: u32) -> Result<MovieSearchResults, CatalogError>;

    async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, CatalogError>;
}

/// TMDb HTTP client
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        movie_id: Option<i64>,
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(path = %path, "Catalog request");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| {
                // the URL carries the api key
                let e = e.without_url();
                warn!(path = %path, error = %e, "Catalog request failed");
                CatalogError::from(e)
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = movie_id {
                return Err(CatalogError::NotFound(id));
            }
        }
        if !status.is_success() {
            warn!(path = %path, status = status.as_u16(), "Catalog returned error status");
            return Err(CatalogError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Decode(e.without_url().to_string()))
    }
}

#[async_trait::async_trait]
impl MovieCatalog for TmdbClient {
    async fn search_movies(&self, query: &str, page: u32) -> Result<MovieSearchResults, CatalogError> {
        self.get_json(
            "/search/movie",
            &[("query", query.to_string()), ("page", page.max(1).to_string())],
            None,
        )
        .await
    }

    async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, CatalogError> {
        let details: MovieDetails = self
            .get_json(&format!("/movie/{}", movie_id), &[], Some(movie_id))
            .await?;
        if details.id != movie_id {
            return Err(CatalogError::Decode(format!(
                "requested movie {} but catalog returned {}",
                movie_id, details.id
            )));
        }
        Ok(details)
    }
}
