//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! PUREWELL_ADMIN_PASSWORD='...' pw-cli admin create -e ops@purewell.co.kr -n "Operations"
//! ```
//!
//! Admins are ordinary `shop.member` rows with `member_type = 'admin'`, created
//! active. The password never appears on the command line.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `PUREWELL_ADMIN_PASSWORD` - Password for the new account

use argon2::Argon2;
use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};
use purewell_admin::db;
use purewell_core::{Email, MemberId};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use super::MissingEnvVar;

const PASSWORD_ENV: &str = "PUREWELL_ADMIN_PASSWORD";
const MIN_PASSWORD_LENGTH: usize = 12;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVar),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Name is blank.
    #[error("Admin name is required")]
    MissingName,

    /// Password too weak for a back-office account.
    #[error("{PASSWORD_ENV} must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    /// Hashing failed.
    #[error("Failed to hash password")]
    PasswordHash,

    /// An account already uses this address.
    #[error("A member already exists with email: {0}")]
    UserExists(String),
}

/// Create a new active admin account.
///
/// # Returns
///
/// The member ID of the created admin.
pub async fn create_user(email: &str, name: &str, phone: &str) -> Result<MemberId, AdminError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AdminError::MissingName);
    }

    let password = std::env::var(PASSWORD_ENV)
        .map(SecretString::from)
        .map_err(|_| MissingEnvVar(PASSWORD_ENV))?;
    let password_hash = hash_password(&password)?;

    let database_url = super::database_url()?;
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let existing: Option<i32> =
        sqlx::query_scalar("SELECT id FROM shop.member WHERE lower(email) = lower($1)")
            .bind(email.as_str())
            .fetch_optional(&pool)
            .await?;
    if existing.is_some() {
        return Err(AdminError::UserExists(email.into_inner()));
    }

    tracing::info!("Creating admin account: {}", email);

    let id: MemberId = sqlx::query_scalar(
        r"
        INSERT INTO shop.member (email, password_hash, name, phone, member_type, status)
        VALUES ($1, $2, $3, $4, 'admin', 'active')
        RETURNING id
        ",
    )
    .bind(email.as_str())
    .bind(&password_hash)
    .bind(name)
    .bind(phone.trim())
    .fetch_one(&pool)
    .await?;

    tracing::info!("Admin account created successfully! ID: {}, Email: {}", id, email);

    Ok(id)
}

/// Check length, then hash with Argon2id.
fn hash_password(password: &SecretString) -> Result<String, AdminError> {
    let password = password.expose_secret();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminError::PasswordHash)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use argon2::{PasswordHash, PasswordVerifier};

    use super::*;

    #[test]
    fn test_short_password_rejected() {
        let result = hash_password(&SecretString::from("short1"));
        assert!(matches!(result, Err(AdminError::WeakPassword)));
    }

    #[test]
    fn test_hash_verifies() {
        let hash = hash_password(&SecretString::from("filter-change-2026")).unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"filter-change-2026", &parsed)
                .is_ok()
        );
    }
}
