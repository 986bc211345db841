use anyhow::Result;
use sqlx::PgPool;

/// Returned by [`FavoritesRepository::add_favorite`] when the user row is gone.
#[derive(Debug, thiserror::Error)]
#[error("user {0} does not exist")]
pub struct UnknownUser(pub i64);

/// Durable list of `(user_id, movie_id)` favorite pairs.
#[async_trait::async_trait]
pub trait FavoritesRepository: Send + Sync {
    /// Favorite movie ids of a user, oldest first. An empty list is not an error.
    async fn list_favorite_ids(&self, user_id: i64) -> Result<Vec<i64>>;

    /// Insert a favorite (idempotent - succeeds if the pair already exists).
    /// Fails with [`UnknownUser`] when `user_id` has no user row.
    async fn add_favorite(&self, user_id: i64, movie_id: i64) -> Result<()>;

    /// Delete a favorite, returning whether the pair existed
    async fn remove_favorite(&self, user_id: i64, movie_id: i64) -> Result<bool>;
}

#[derive(Clone)]
pub struct PgFavoritesRepository {
    pool: PgPool,
}

impl PgFavoritesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FavoritesRepository for PgFavoritesRepository {
    async fn list_favorite_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT movie_id FROM user_favorites
            WHERE user_id = $1
            ORDER BY created_at, movie_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn add_favorite(&self, user_id: i64, movie_id: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_favorites (user_id, movie_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, movie_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(UnknownUser(user_id).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_favorite(&self, user_id: i64, movie_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_favorites
            WHERE user_id = $1 AND movie_id = $2
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
