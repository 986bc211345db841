use super::auth::BearerHeader;
use super::{AppState, AuthUser};
use crate::error::Result;
use crate::models::{LoginRequest, PublicUser, RegisterRequest, UpdateUserRequest};
use crate::security::TokenPair;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, Unix seconds
    pub expires_at: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_at: pair.access_expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>)> {
    let user = state.users.register(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let pair = state.users.login(req).await?;
    Ok(Json(pair.into()))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>> {
    let pair = state.tokens.refresh(&req.refresh_token).await?;
    Ok(Json(pair.into()))
}

pub async fn logout(
    State(state): State<AppState>,
    BearerHeader(header): BearerHeader,
) -> Result<Json<LogoutResponse>> {
    let revoked = state.tokens.revoke_session(&header).await?;
    Ok(Json(LogoutResponse { revoked }))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PublicUser>>> {
    Ok(Json(state.users.search_users(&params.q).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<PublicUser>> {
    Ok(Json(state.users.get_user(user_id).await?))
}

pub async fn replace_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>> {
    auth.ensure_owner(user_id)?;
    Ok(Json(state.users.update_user(user_id, req, false).await?))
}

pub async fn patch_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>> {
    auth.ensure_owner(user_id)?;
    Ok(Json(state.users.update_user(user_id, req, true).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<StatusCode> {
    auth.ensure_owner(user_id)?;
    state.users.delete_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
