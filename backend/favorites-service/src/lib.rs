/// Movie Favorites Service Library
///
/// ## Modules
///
/// - `config`: Layered settings and environment-only token secrets
/// - `db`: Durable store repositories (users, favorites)
/// - `error`: Error taxonomy and HTTP mapping
/// - `http`: axum router and handlers
/// - `models`: Data models
/// - `security`: Session tokens, password hashing
/// - `services`: Favorites reconciliation, movie catalog, user accounts
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod security;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use error::{AuthError, CatalogError, FavoritesError, Result, ServiceError};
pub use http::{build_router, AppState};
