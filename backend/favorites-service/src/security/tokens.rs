//! Session token service
//!
//! Tokens are HS256 JWTs. A token is valid only while three things hold:
//! its signature verifies, its `exp` has not passed, and its session id is
//! still a key in the cache store. Deleting that key revokes the token, so no
//! separate denylist is kept.
//!
//! An access token also names the refresh session minted with it, so a
//! logout ends the whole login rather than one half of the pair.
//!
//! Store failures are never retried and never read as "session missing".

use crate::config::TokenSecrets;
use crate::error::AuthError;
use cache_store::{CacheKey, CacheStore};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user id, decimal string)
    pub sub: String,
    pub session_id: String,
    /// Refresh session issued alongside this token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id_refresh: Option<String>,
    pub authorized: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub session_id_refresh: String,
    pub iat: i64,
    pub exp: i64,
}

/// Result of a successful login or refresh. Expiries are Unix seconds.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_session_id: String,
    pub refresh_session_id: String,
    pub access_expires_at: i64,
    pub refresh_expires_at: i64,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

pub struct TokenService {
    store: Arc<dyn CacheStore>,
    access: SigningKeys,
    refresh: SigningKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl TokenService {
    pub fn new(
        store: Arc<dyn CacheStore>,
        secrets: &TokenSecrets,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            store,
            access: SigningKeys::from_secret(secrets.access_bytes()),
            refresh: SigningKeys::from_secret(secrets.refresh_bytes()),
            access_ttl,
            refresh_ttl,
            validation,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Issue an access/refresh pair and record both session ids.
    ///
    /// Both ledger writes must succeed; otherwise no pair is returned. A key
    /// written before a failure is not rolled back and simply expires.
    pub async fn issue_token_pair(&self, user_id: i64) -> Result<TokenPair, AuthError> {
        let now = Utc::now().timestamp();
        let access_session_id = Uuid::new_v4().to_string();
        let refresh_session_id = Uuid::new_v4().to_string();
        let access_expires_at = expires_at(now, self.access_ttl);
        let refresh_expires_at = expires_at(now, self.refresh_ttl);

        let access_claims = AccessClaims {
            sub: user_id.to_string(),
            session_id: access_session_id.clone(),
            session_id_refresh: Some(refresh_session_id.clone()),
            authorized: true,
            iat: now,
            exp: access_expires_at,
        };
        let refresh_claims = RefreshClaims {
            sub: user_id.to_string(),
            session_id_refresh: refresh_session_id.clone(),
            iat: now,
            exp: refresh_expires_at,
        };

        let header = Header::new(Algorithm::HS256);
        let access_token = encode(&header, &access_claims, &self.access.encoding)
            .map_err(|e| AuthError::TokenIssuance(format!("signing access token: {}", e)))?;
        let refresh_token = encode(&header, &refresh_claims, &self.refresh.encoding)
            .map_err(|e| AuthError::TokenIssuance(format!("signing refresh token: {}", e)))?;

        self.record_session(&access_session_id, user_id, self.access_ttl)
            .await?;
        self.record_session(&refresh_session_id, user_id, self.refresh_ttl)
            .await?;

        info!(user_id = user_id, session_id = %access_session_id, "Issued token pair");

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_session_id,
            refresh_session_id,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Map an `Authorization` header to the user id recorded for its session.
    ///
    /// The stored user id wins over the `sub` claim.
    pub async fn resolve_session(&self, authorization: &str) -> Result<i64, AuthError> {
        let token = bearer_token(authorization)?;
        let claims = self.verify_access(token)?;
        let key = CacheKey::session(&claims.session_id);

        let user_id = self.lookup_session(&key).await?;
        debug!(user_id = user_id, "Session resolved");
        Ok(user_id)
    }

    /// Revoke the session behind an access token together with the refresh
    /// session issued with it. Returns `false` when the access session was
    /// already gone.
    pub async fn revoke_session(&self, authorization: &str) -> Result<bool, AuthError> {
        let token = bearer_token(authorization)?;
        let claims = self.verify_access(token)?;

        let removed = self
            .delete_session(&CacheKey::session(&claims.session_id))
            .await?;
        let refresh_removed = match claims.session_id_refresh.as_deref() {
            Some(refresh_id) => self.delete_session(&CacheKey::session(refresh_id)).await?,
            None => false,
        };

        info!(
            sub = %claims.sub,
            removed = removed,
            refresh_removed = refresh_removed,
            "Session revoked"
        );
        Ok(removed)
    }

    /// Exchange a refresh token for a new pair. Each refresh session id is
    /// single use: it is deleted before the new pair is issued.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims: RefreshClaims =
            decode_claims(refresh_token, &self.refresh.decoding, &self.validation)?;
        if claims.session_id_refresh.trim().is_empty() {
            return Err(AuthError::MalformedClaims);
        }
        parse_subject(&claims.sub)?;

        let key = CacheKey::session(&claims.session_id_refresh);
        let user_id = self.lookup_session(&key).await?;

        let removed = self.delete_session(&key).await?;
        if !removed {
            // lost a race with a concurrent refresh of the same token
            return Err(AuthError::SessionNotFound);
        }

        self.issue_token_pair(user_id).await
    }

    fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let claims: AccessClaims = decode_claims(token, &self.access.decoding, &self.validation)?;
        let blank_refresh = claims
            .session_id_refresh
            .as_deref()
            .is_some_and(|id| id.trim().is_empty());
        if !claims.authorized || claims.session_id.trim().is_empty() || blank_refresh {
            return Err(AuthError::MalformedClaims);
        }
        parse_subject(&claims.sub)?;
        Ok(claims)
    }

    async fn record_session(
        &self,
        session_id: &str,
        user_id: i64,
        ttl: Duration,
    ) -> Result<(), AuthError> {
        self.store
            .set_ex(&CacheKey::session(session_id), &user_id.to_string(), ttl)
            .await
            .map_err(|e| {
                warn!(user_id = user_id, error = %e, "Failed to record session");
                AuthError::TokenIssuance(e.to_string())
            })
    }

    async fn delete_session(&self, key: &str) -> Result<bool, AuthError> {
        self.store.del(key).await.map_err(|e| {
            warn!(error = %e, "Session delete failed");
            AuthError::StoreUnavailable(e.to_string())
        })
    }

    async fn lookup_session(&self, key: &str) -> Result<i64, AuthError> {
        let stored = self.store.get(key).await.map_err(|e| {
            warn!(error = %e, "Session lookup failed");
            AuthError::StoreUnavailable(e.to_string())
        })?;

        let value = stored.ok_or(AuthError::SessionNotFound)?;
        value.parse::<i64>().map_err(|_| {
            warn!("Session ledger holds a non-numeric user id");
            AuthError::StoreUnavailable("corrupt session entry".to_string())
        })
    }
}

fn expires_at(now: i64, ttl: Duration) -> i64 {
    now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
}

/// Split `"<scheme> <token>"` into its token part.
fn bearer_token(authorization: &str) -> Result<&str, AuthError> {
    let mut parts = authorization.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if !scheme.is_empty() && !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

fn parse_subject(sub: &str) -> Result<i64, AuthError> {
    sub.parse::<i64>().map_err(|_| AuthError::MalformedClaims)
}

fn decode_claims<T: DeserializeOwned>(
    token: &str,
    key: &DecodingKey,
    validation: &Validation,
) -> Result<T, AuthError> {
    // A header that does not parse is a forged or mangled token, not bad claims.
    decode_header(token).map_err(|_| AuthError::InvalidSignature)?;

    decode::<T>(token, key, validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            ErrorKind::Json(_) | ErrorKind::Utf8(_) | ErrorKind::MissingRequiredClaim(_) => {
                AuthError::MalformedClaims
            }
            _ => AuthError::InvalidSignature,
        })
}
