use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Failures of the token service.
///
/// Callers must treat every authentication sub-case the same way; see
/// [`AuthError::is_unauthenticated`].
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization header is not of the form '<scheme> <token>'")]
    MalformedHeader,

    #[error("Token claims are missing or malformed")]
    MalformedClaims,

    #[error("Token signature or algorithm is invalid")]
    InvalidSignature,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Token issuance failed: {0}")]
    TokenIssuance(String),
}

impl AuthError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedHeader
                | AuthError::MalformedClaims
                | AuthError::InvalidSignature
                | AuthError::ExpiredToken
                | AuthError::SessionNotFound
        )
    }
}

/// Failures of the favorites reconciler. Never carries a partial result.
#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("Failed to retrieve favorites: {0}")]
    Retrieval(String),

    #[error("Failed to add favorite: {0}")]
    Add(String),

    /// The user behind a still-live session has been deleted.
    #[error("User {0} not found")]
    UnknownUser(i64),

    #[error("Failed to remove favorite: {0}")]
    Remove(String),
}

/// Failures of the external movie catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Request(String),

    #[error("Movie {0} not found in catalog")]
    NotFound(i64),

    #[error("Catalog returned HTTP {0}")]
    Status(u16),

    #[error("Catalog response could not be decoded: {0}")]
    Decode(String),

    #[error("Catalog request timed out")]
    Timeout,
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout
        } else if err.is_decode() {
            CatalogError::Decode(err.to_string())
        } else {
            CatalogError::Request(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Favorites(#[from] FavoritesError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("User ID in the request does not match token user ID")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// JSON error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub status: u16,
    pub error: &'static str,
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Auth(e) if e.is_unauthenticated() => StatusCode::UNAUTHORIZED,
            ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::UserNotFound
            | ServiceError::Favorites(FavoritesError::UnknownUser(_)) => StatusCode::NOT_FOUND,
            ServiceError::Catalog(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServiceError::EmailAlreadyExists => StatusCode::CONFLICT,
            ServiceError::Validation(_) | ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Catalog(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Auth(_)
            | ServiceError::Favorites(_)
            | ServiceError::Database(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details never leave the process.
    fn public_message(&self) -> String {
        match self {
            ServiceError::Auth(e) if e.is_unauthenticated() => {
                "Invalid, expired, or revoked token".to_string()
            }
            ServiceError::InvalidCredentials => "Invalid credentials".to_string(),
            ServiceError::Forbidden
            | ServiceError::UserNotFound
            | ServiceError::EmailAlreadyExists
            | ServiceError::Validation(_)
            | ServiceError::BadRequest(_)
            | ServiceError::Catalog(CatalogError::NotFound(_)) => self.to_string(),
            ServiceError::Catalog(_) => "Movie catalog unavailable".to_string(),
            ServiceError::Favorites(FavoritesError::Retrieval(_)) => {
                "Error when trying to get user favorites".to_string()
            }
            ServiceError::Favorites(FavoritesError::Add(_)) => {
                "Error when trying to add user favorite".to_string()
            }
            ServiceError::Favorites(FavoritesError::UnknownUser(_)) => {
                ServiceError::UserNotFound.to_string()
            }
            ServiceError::Favorites(FavoritesError::Remove(_)) => {
                "Error when trying to remove user favorite".to_string()
            }
            ServiceError::Auth(_) | ServiceError::Database(_) | ServiceError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

fn error_label(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::UNAUTHORIZED => "unauthorized",
        StatusCode::FORBIDDEN => "forbidden",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::CONFLICT => "conflict",
        StatusCode::BAD_GATEWAY => "bad_gateway",
        _ => "internal_server_error",
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = ErrorBody {
            message: self.public_message(),
            status: status.as_u16(),
            error: error_label(status),
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        ServiceError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}
