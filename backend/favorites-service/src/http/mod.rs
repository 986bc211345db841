//! HTTP surface
//!
//! Handlers only parse input, call a service and map the result; all
//! behavior lives in `security` and `services`.

mod auth;
mod favorites;
mod movies;
mod users;

pub use auth::AuthUser;

use crate::security::TokenService;
use crate::services::{FavoritesService, MovieCatalog, UserService};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared HTTP server state. Every dependency is injected at startup.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub favorites: Arc<FavoritesService>,
    pub users: Arc<UserService>,
    pub catalog: Arc<dyn MovieCatalog>,
    pub registry: Registry,
}

/// Build the HTTP router with all public endpoints
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/token/refresh", post(users::refresh))
        .route("/logout", post(users::logout))
        .route("/users/search", get(users::search))
        .route(
            "/users/:user_id",
            get(users::get_user)
                .put(users::replace_user)
                .patch(users::patch_user)
                .delete(users::delete_user),
        )
        .route(
            "/users/:user_id/favorites",
            get(favorites::list).post(favorites::add),
        )
        .route(
            "/users/:user_id/favorites/:movie_id",
            delete(favorites::remove),
        )
        .route("/movies/search", get(movies::search))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint (no auth required)
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&state.registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response();
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(state: AppState, addr: &str, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Starting HTTP server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
