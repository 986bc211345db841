/// Movie Favorites Service Main Entry Point
///
/// Starts the HTTP server with:
/// - PostgreSQL connection pool (users, favorites)
/// - Redis connection manager (session ledger, movie cache)
/// - TMDb catalog client
use anyhow::{Context, Result};
use cache_store::{CacheMetrics, CacheStore, RedisStore};
use favorites_service::{
    config::{Settings, TokenSecrets},
    db::PgFavoritesRepository,
    http::{self, AppState},
    security::TokenService,
    services::{FavoritesService, MovieCache, MovieCatalog, TmdbClient, UserService},
};
use prometheus::Registry;
use redis_utils::RedisPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    init_tracing(&settings.log.format);

    info!("Starting Movie Favorites Service");

    let secrets = TokenSecrets::from_env().context("Failed to load token secrets")?;
    info!("Token secrets loaded");

    // Initialize database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .acquire_timeout(Duration::from_secs(settings.database.acquire_timeout_secs))
        .connect(&settings.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!(
        "Database pool initialized with {} max connections",
        settings.database.max_connections
    );

    if settings.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations completed");
    } else {
        warn!("Skipping database migrations");
    }

    // Initialize Redis connection pool
    let redis_pool = RedisPool::connect(
        &settings.redis.url,
        settings.redis.connect_timeout(),
        settings.redis.command_timeout(),
    )
    .await
    .context("Failed to connect to Redis")?;
    let store: Arc<dyn CacheStore> = Arc::new(RedisStore::new(
        redis_pool.manager(),
        redis_pool.command_timeout(),
    ));
    info!("Redis connection manager initialized");

    let registry = Registry::new();
    CacheMetrics::register(&registry).context("Failed to register cache metrics")?;

    let catalog: Arc<dyn MovieCatalog> = Arc::new(
        TmdbClient::new(
            &settings.catalog.base_url,
            &settings.catalog.api_key,
            settings.catalog.timeout(),
        )
        .context("Failed to build catalog client")?,
    );

    let tokens = Arc::new(TokenService::new(
        store.clone(),
        &secrets,
        settings.jwt.access_ttl(),
        settings.jwt.refresh_ttl(),
    ));

    let favorites = Arc::new(FavoritesService::new(
        Arc::new(PgFavoritesRepository::new(db_pool.clone())),
        MovieCache::new(store, settings.cache.ttl()),
        catalog.clone(),
        settings.catalog.timeout(),
        settings.catalog.max_concurrency,
    ));

    let users = Arc::new(UserService::new(db_pool, tokens.clone()));

    let state = AppState {
        tokens,
        favorites,
        users,
        catalog,
        registry,
    };

    http::serve(state, &settings.bind_address(), shutdown_signal()).await?;

    info!("Movie Favorites Service shut down");
    Ok(())
}

fn init_tracing(format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "favorites_service=info,info".into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if format.eq_ignore_ascii_case("pretty") {
        builder.pretty().init();
    } else {
        builder.json().init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
