use crate::models::MovieDetails;
use serde::{Deserialize, Serialize};

/// Request-scoped result of favorites reconciliation. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct FavoritesView {
    pub user_id: i64,
    /// Favorite ids in durable-store order.
    pub movie_ids: Vec<i64>,
    /// One entry per distinct id in `movie_ids`.
    pub movie_details: Vec<MovieDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddFavoriteRequest {
    pub movie_id: i64,
}
