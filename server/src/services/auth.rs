//! Password authentication: sign-up, sign-in, credential hashing.
//!
//! Sign-up runs the workspace email rule before touching the database, so a
//! rejected attempt leaves no rows behind. Hashing uses bcrypt on the
//! blocking pool to keep the async workers free.

use sqlx::{PgPool, Row};
use tenancy::SessionUser;
use tenancy::email::{SignupError, normalize_email, validate_signup_request};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Signup(#[from] SignupError),
    #[error("User already registered")]
    AlreadyRegistered,
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Hash a password with bcrypt's default cost.
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))?
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Verify a password against a stored bcrypt hash. Malformed hashes never verify.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Register a new identity. Returns the created user.
///
/// # Errors
///
/// Fails with [`AuthError::Signup`] when the email, password or workspace rule
/// rejects the attempt, and [`AuthError::AlreadyRegistered`] for a duplicate email.
pub async fn sign_up(
    pool: &PgPool,
    email: &str,
    password: &str,
    domain: Option<&str>,
    creating_workspace: bool,
) -> Result<SessionUser, AuthError> {
    let normalized = validate_signup_request(email, password, domain, creating_workspace)?;
    let password_hash = hash_password(password).await?;

    let row = sqlx::query(
        "INSERT INTO users (email, password_hash) VALUES ($1, $2)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(&normalized)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Err(AuthError::AlreadyRegistered);
    };
    let id: Uuid = row.get("id");
    tracing::info!(user_id = %id, creating_workspace, "user registered");
    Ok(SessionUser { id, email: normalized })
}

/// Check credentials and return the user on success.
///
/// # Errors
///
/// Unknown emails and wrong passwords both yield [`AuthError::InvalidCredentials`].
pub async fn sign_in(pool: &PgPool, email: &str, password: &str) -> Result<SessionUser, AuthError> {
    let normalized = normalize_email(email).ok_or(AuthError::InvalidCredentials)?;

    let row = sqlx::query("SELECT id, password_hash FROM users WHERE email = $1")
        .bind(&normalized)
        .fetch_optional(pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let hash: String = row.get("password_hash");
    if !verify_password(password, &hash).await? {
        return Err(AuthError::InvalidCredentials);
    }
    Ok(SessionUser { id: row.get("id"), email: normalized })
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
