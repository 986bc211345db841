//! Router-level tests. The Postgres pool is lazy and never touched by these routes.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{harness, Harness};
use favorites_service::db::FavoritesRepository;
use favorites_service::services::UserService;
use favorites_service::{build_router, AppState};
use prometheus::Registry;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (Router, Harness) {
    let h = harness();
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://favorites@localhost:5432/unused")
        .unwrap();
    let state = AppState {
        tokens: h.tokens.clone(),
        favorites: h.favorites.clone(),
        users: Arc::new(UserService::new(pool, h.tokens.clone())),
        catalog: h.catalog.clone(),
        registry: Registry::new(),
    };
    (build_router(state), h)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn health_and_metrics() {
    let (app, _) = app();
    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn favorites_round_trip_over_http() {
    let (app, h) = app();
    let pair = h.tokens.issue_token_pair(42).await.unwrap();

    let (status, _) = send(
        &app,
        post_json("/users/42/favorites", Some(pair.access_token.as_str()), json!({"movie_id": 7})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Request::get("/users/42/favorites").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], 42);
    assert_eq!(body["movie_ids"], json!([7]));
    assert_eq!(body["movie_details"][0]["id"], 7);

    let delete = |uri: &str| {
        Request::delete(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", pair.access_token))
            .body(Body::empty())
            .unwrap()
    };
    let (status, _) = send(&app, delete("/users/42/favorites/7")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, delete("/users/42/favorites/7")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn auth_failures_look_identical() {
    let (app, h) = app();
    let pair = h.tokens.issue_token_pair(42).await.unwrap();
    h.tokens
        .revoke_session(&format!("Bearer {}", pair.access_token))
        .await
        .unwrap();

    let missing = send(&app, post_json("/users/42/favorites", None, json!({"movie_id": 7}))).await;
    let garbage = send(
        &app,
        post_json("/users/42/favorites", Some("not-a-token"), json!({"movie_id": 7})),
    )
    .await;
    let revoked = send(
        &app,
        post_json("/users/42/favorites", Some(pair.access_token.as_str()), json!({"movie_id": 7})),
    )
    .await;

    for (status, body) in [&missing, &garbage, &revoked] {
        assert_eq!(*status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid, expired, or revoked token");
        assert_eq!(body["status"], 401);
        assert_eq!(body["error"], "unauthorized");
    }
    assert_eq!(missing.1, revoked.1);
    assert!(h.catalog.fetched.lock().await.is_empty());
}

#[tokio::test]
async fn token_for_another_user_is_forbidden() {
    let (app, h) = app();
    let pair = h.tokens.issue_token_pair(42).await.unwrap();

    let (status, body) = send(
        &app,
        post_json("/users/43/favorites", Some(pair.access_token.as_str()), json!({"movie_id": 7})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], 403);
    assert!(h.repository.list_favorite_ids(43).await.unwrap().is_empty());
}

#[tokio::test]
async fn logout_ends_refresh_session() {
    let (app, h) = app();
    let pair = h.tokens.issue_token_pair(42).await.unwrap();

    let (status, body) = send(&app, post_json("/logout", Some(pair.access_token.as_str()), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], true);

    let (status, body) = send(&app, post_json("/logout", Some(pair.access_token.as_str()), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], false);

    let (status, body) = send(
        &app,
        post_json("/token/refresh", None, json!({"refresh_token": pair.refresh_token})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn movie_search_requires_query() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        Request::get("/movies/search?query=matrix&page=2").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 2);

    let (status, body) = send(&app, Request::get("/movies/search").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn unknown_movie_is_reported_as_add_failure() {
    let (app, h) = app();
    let pair = h.tokens.issue_token_pair(1).await.unwrap();

    let (status, body) = send(
        &app,
        post_json("/users/1/favorites", Some(pair.access_token.as_str()), json!({"movie_id": 404})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error when trying to add user favorite");
}
