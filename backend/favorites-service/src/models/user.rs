use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Status assigned to newly registered accounts.
pub const STATUS_ACTIVE: &str = "active";

/// User row, including the password hash. Never serialized to clients.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

impl RegisterRequest {
    /// Trim surrounding whitespace before validation.
    pub fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// PUT replaces every field, PATCH only the ones present.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

impl UpdateUserRequest {
    pub fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.map(|s| s.trim().to_string()),
            last_name: self.last_name.map(|s| s.trim().to_string()),
            email: self.email.map(|s| s.trim().to_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_rejects_blank_names_after_trim() {
        let req = RegisterRequest {
            first_name: "   ".into(),
            last_name: "Doe".into(),
            email: "jane@example.com".into(),
            password: "correct horse".into(),
        }
        .normalized();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_register_request_rejects_bad_email() {
        let req = RegisterRequest {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "not-an-email".into(),
            password: "correct horse".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_register_request_normalizes_email() {
        let req = RegisterRequest {
            first_name: " Jane ".into(),
            last_name: "Doe".into(),
            email: " Jane@Example.COM ".into(),
            password: "correct horse".into(),
        }
        .normalized();
        assert_eq!(req.first_name, "Jane");
        assert_eq!(req.email, "jane@example.com");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_public_user_drops_hash() {
        let user = User {
            id: 1,
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@example.com".into(),
            password_hash: "$argon2id$...".into(),
            status: STATUS_ACTIVE.to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"status\":\"active\""));
    }
}
