//! Account registration, login and profile CRUD

use crate::db::users;
use crate::error::{Result, ServiceError};
use crate::models::{LoginRequest, PublicUser, RegisterRequest, UpdateUserRequest};
use crate::security::{hash_password, verify_password, TokenPair, TokenService};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub struct UserService {
    pool: PgPool,
    tokens: Arc<TokenService>,
}

impl UserService {
    pub fn new(pool: PgPool, tokens: Arc<TokenService>) -> Self {
        Self { pool, tokens }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<PublicUser> {
        let req = req.normalized();
        req.validate()?;

        let password_hash = hash_password(&req.password)?;
        let user = users::create(
            &self.pool,
            &req.first_name,
            &req.last_name,
            &req.email,
            &password_hash,
        )
        .await?;

        info!(user_id = user.id, "User registered");
        Ok(user.into())
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, req: LoginRequest) -> Result<TokenPair> {
        let email = req.email.trim().to_lowercase();
        let user = users::find_by_email(&self.pool, &email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !verify_password(&req.password, &user.password_hash)? {
            return Err(ServiceError::InvalidCredentials);
        }

        let pair = self.tokens.issue_token_pair(user.id).await?;
        info!(user_id = user.id, "User logged in");
        Ok(pair)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<PublicUser> {
        users::find_by_id(&self.pool, user_id)
            .await?
            .map(PublicUser::from)
            .ok_or(ServiceError::UserNotFound)
    }

    /// `partial = false` (PUT) requires every field; `true` (PATCH) applies what is present.
    pub async fn update_user(
        &self,
        user_id: i64,
        req: UpdateUserRequest,
        partial: bool,
    ) -> Result<PublicUser> {
        let req = req.normalized();
        if !partial
            && (req.first_name.is_none() || req.last_name.is_none() || req.email.is_none())
        {
            return Err(ServiceError::Validation(
                "first_name, last_name and email are required".to_string(),
            ));
        }
        req.validate()?;

        let user = users::update(&self.pool, user_id, &req)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        info!(user_id = user_id, partial = partial, "User updated");
        Ok(user.into())
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<()> {
        if !users::delete(&self.pool, user_id).await? {
            return Err(ServiceError::UserNotFound);
        }
        info!(user_id = user_id, "User deleted");
        Ok(())
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<PublicUser>> {
        let (first, last) = parse_search_query(query)
            .ok_or_else(|| ServiceError::BadRequest("query must not be empty".to_string()))?;
        let found = users::search(&self.pool, &first, &last).await?;
        Ok(found.into_iter().map(PublicUser::from).collect())
    }
}

/// First word is a first-name prefix, the rest a last-name fragment.
fn parse_search_query(query: &str) -> Option<(String, String)> {
    let mut words = query.split_whitespace();
    let first = words.next()?.to_string();
    let last = words.collect::<Vec<_>>().join(" ");
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_query() {
        assert_eq!(
            parse_search_query("  Ann  van der Berg "),
            Some(("Ann".to_string(), "van der Berg".to_string()))
        );
        assert_eq!(
            parse_search_query("Ann"),
            Some(("Ann".to_string(), String::new()))
        );
        assert_eq!(parse_search_query("   "), None);
    }
}
