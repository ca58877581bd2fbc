//! Admin authentication service.
//!
//! Admins are ordinary members with type `admin`, signing in with the same
//! Argon2id password hash the storefront writes.

mod error;

pub use error::AdminAuthError;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use sqlx::PgPool;

use purewell_core::Email;

use crate::db::MemberRepository;
use crate::models::CurrentAdmin;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    members: MemberRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            members: MemberRepository::new(pool),
        }
    }

    /// Check an email and password against active admin accounts.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` for anything other than
    /// an active admin with a matching password.
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentAdmin, AdminAuthError> {
        let email = Email::parse(email)?;

        let (member, hash) = self
            .members
            .get_admin_credentials(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &hash)?;

        Ok(CurrentAdmin {
            id: member.id,
            email: member.email,
            name: member.name,
        })
    }
}

/// Verify a password against an Argon2 PHC string.
fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};

    use super::*;

    fn hash(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_verify_password() {
        let stored = hash("correct horse battery");
        assert!(verify_password("correct horse battery", &stored).is_ok());
        assert!(matches!(
            verify_password("wrong", &stored),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_malformed_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }
}
