use super::AppState;
use crate::error::{Result, ServiceError};
use crate::models::MovieSearchResults;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub page: Option<u32>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<MovieSearchResults>> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(ServiceError::BadRequest("query must not be empty".to_string()));
    }
    let page = params.page.unwrap_or(1).max(1);
    Ok(Json(state.catalog.search_movies(query, page).await?))
}
