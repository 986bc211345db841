/// User database operations
use crate::error::{Result, ServiceError};
use crate::models::{UpdateUserRequest, User, STATUS_ACTIVE};
use sqlx::PgPool;

const SEARCH_LIMIT: i64 = 50;

/// Insert a new user. A duplicate email maps to `EmailAlreadyExists`.
pub async fn create(
    pool: &PgPool,
    first_name: &str,
    last_name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User> {
    let result = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (first_name, last_name, email, password_hash, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, first_name, last_name, email, password_hash, status, created_at
        "#,
    )
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(password_hash)
    .bind(STATUS_ACTIVE)
    .fetch_one(pool)
    .await;

    match result {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(ServiceError::EmailAlreadyExists)
        }
        Err(e) => Err(e.into()),
    }
}

/// Find user by email
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, first_name, last_name, email, password_hash, status, created_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Find user by ID
pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, first_name, last_name, email, password_hash, status, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Apply the fields present in `changes`; absent fields keep their value.
pub async fn update(pool: &PgPool, id: i64, changes: &UpdateUserRequest) -> Result<Option<User>> {
    let result = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET first_name = COALESCE($2, first_name),
            last_name = COALESCE($3, last_name),
            email = COALESCE($4, email)
        WHERE id = $1
        RETURNING id, first_name, last_name, email, password_hash, status, created_at
        "#,
    )
    .bind(id)
    .bind(changes.first_name.as_deref())
    .bind(changes.last_name.as_deref())
    .bind(changes.email.as_deref())
    .fetch_optional(pool)
    .await;

    match result {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(ServiceError::EmailAlreadyExists)
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a user; favorites cascade. Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Case-insensitive search: first name by prefix, last name by substring.
/// An empty `last_name_fragment` matches every last name.
pub async fn search(
    pool: &PgPool,
    first_name_prefix: &str,
    last_name_fragment: &str,
) -> Result<Vec<User>> {
    let first_pattern = format!("{}%", escape_like(first_name_prefix));
    let last_pattern = format!("%{}%", escape_like(last_name_fragment));

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, first_name, last_name, email, password_hash, status, created_at
        FROM users
        WHERE first_name ILIKE $1 AND last_name ILIKE $2
        ORDER BY first_name, last_name, id
        LIMIT $3
        "#,
    )
    .bind(first_pattern)
    .bind(last_pattern)
    .bind(SEARCH_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
