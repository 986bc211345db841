use super::AppState;
use crate::error::{AuthError, ServiceError};
use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

/// Authenticated caller, resolved through the session ledger.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

impl AuthUser {
    /// Mutations on `/users/:user_id/...` are limited to the owner.
    pub fn ensure_owner(&self, path_user_id: i64) -> Result<(), ServiceError> {
        if self.0 != path_user_id {
            tracing::warn!(token_user = self.0, path_user = path_user_id, "User mismatch");
            return Err(ServiceError::Forbidden);
        }
        Ok(())
    }
}

/// Raw `Authorization` header value. Missing or non-ASCII is a malformed header.
pub(super) fn authorization(parts: &Parts) -> Result<&str, ServiceError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ServiceError::Auth(AuthError::MalformedHeader))
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = authorization(parts)?;
        let user_id = state.tokens.resolve_session(header).await?;
        Ok(AuthUser(user_id))
    }
}

/// The raw header, for endpoints that act on the token itself (logout).
pub struct BearerHeader(pub String);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerHeader {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authorization(parts).map(|h| BearerHeader(h.to_string()))
    }
}
