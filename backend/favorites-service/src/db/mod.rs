//! Durable store access (PostgreSQL via sqlx)

pub mod favorites;
pub mod users;

pub use favorites::{FavoritesRepository, PgFavoritesRepository, UnknownUser};
