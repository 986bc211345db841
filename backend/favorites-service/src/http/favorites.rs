use super::{AppState, AuthUser};
use crate::error::{Result, ServiceError};
use crate::models::{AddFavoriteRequest, FavoritesView};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

/// Public, like the profile list it mirrors.
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<FavoritesView>> {
    Ok(Json(state.favorites.get_favorites(user_id).await?))
}

pub async fn add(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
    Json(req): Json<AddFavoriteRequest>,
) -> Result<StatusCode> {
    auth.ensure_owner(user_id)?;
    if req.movie_id <= 0 {
        return Err(ServiceError::BadRequest("movie_id must be positive".to_string()));
    }
    state.favorites.add_favorite(user_id, req.movie_id).await?;
    Ok(StatusCode::CREATED)
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((user_id, movie_id)): Path<(i64, i64)>,
) -> Result<StatusCode> {
    auth.ensure_owner(user_id)?;
    if state.favorites.remove_favorite(user_id, movie_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}
