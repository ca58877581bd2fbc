//! Authentication and account service.
//!
//! Passwords are hashed with Argon2id. Corporate sign-ups start `pending`:
//! headquarters wait for an admin, branches for their headquarters.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use sqlx::PgPool;

use purewell_core::models::Member;
use purewell_core::{BusinessNumber, Email, MemberId, MemberStatus, MemberType, PhoneNumber};

use crate::db::members::NewMember;
use crate::db::{MemberRepository, OrderRepository, RepositoryError};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Sign-up form.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub member_type: MemberType,
    pub business_name: Option<String>,
    pub business_number: Option<String>,
    pub representative: Option<String>,
    /// Business number of the parent headquarters, for branches.
    pub headquarters_code: Option<String>,
}

/// Authentication service.
pub struct AuthService<'a> {
    members: MemberRepository<'a>,
    orders: OrderRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            members: MemberRepository::new(pool),
            orders: OrderRepository::new(pool),
        }
    }

    /// Register a new member.
    ///
    /// Individuals are active immediately. Headquarters need a valid business
    /// number; branches name an active headquarters by its business number.
    pub async fn register(&self, form: &Registration) -> Result<Member, AuthError> {
        let email = Email::parse(&form.email)?;
        validate_password(&form.password)?;
        let name = required(&form.name, "name")?;
        let phone = PhoneNumber::parse(&form.phone)?;

        let (status, business_number, headquarters_id) = match form.member_type {
            MemberType::Individual => (MemberStatus::Active, None, None),
            MemberType::Headquarters => {
                let raw = form
                    .business_number
                    .as_deref()
                    .ok_or(AuthError::MissingField("business_number"))?;
                (MemberStatus::Pending, Some(BusinessNumber::parse(raw)?), None)
            }
            MemberType::Branch => {
                let raw = form
                    .headquarters_code
                    .as_deref()
                    .ok_or(AuthError::MissingField("headquarters_code"))?;
                let code = BusinessNumber::parse(raw)?;
                let headquarters = self
                    .members
                    .find_active_headquarters(code.as_str())
                    .await?
                    .ok_or(AuthError::HeadquartersNotFound)?;
                (MemberStatus::Pending, Some(code), Some(headquarters.id))
            }
            other @ MemberType::Admin => return Err(AuthError::InvalidMemberType(other)),
        };

        let business_name = if form.member_type.is_corporate() {
            Some(required(
                form.business_name.as_deref().unwrap_or_default(),
                "business_name",
            )?)
        } else {
            None
        };

        let password_hash = hash_password(&form.password)?;

        let member = self
            .members
            .create(&NewMember {
                email: &email,
                password_hash: &password_hash,
                name,
                phone: phone.as_str(),
                member_type: form.member_type,
                status,
                business_name,
                business_number: business_number.as_ref().map(BusinessNumber::as_str),
                representative: form
                    .representative
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty()),
                headquarters_id,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::MemberAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(member)
    }

    /// Login with email and password. Only active members get through.
    pub async fn login(&self, email: &str, password: &str) -> Result<Member, AuthError> {
        let email = Email::parse(email)?;

        let (member, password_hash) = self
            .members
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        match member.status {
            MemberStatus::Active => Ok(member),
            MemberStatus::Pending => Err(AuthError::AccountPending),
            MemberStatus::Rejected => Err(AuthError::AccountRejected),
            MemberStatus::Withdrawn => Err(AuthError::InvalidCredentials),
        }
    }

    /// Get a member by ID.
    pub async fn get_member(&self, id: MemberId) -> Result<Member, AuthError> {
        self.members
            .get_by_id(id)
            .await?
            .ok_or(AuthError::MemberNotFound)
    }

    /// Update name and phone.
    pub async fn update_profile(
        &self,
        id: MemberId,
        name: &str,
        phone: &str,
    ) -> Result<Member, AuthError> {
        let name = required(name, "name")?;
        let phone = PhoneNumber::parse(phone)?;
        let member = self.members.update_profile(id, name, phone.as_str()).await?;
        Ok(member)
    }

    /// Change the password after checking the current one.
    pub async fn change_password(
        &self,
        id: MemberId,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        self.check_password(id, current).await?;
        validate_password(new)?;
        let hash = hash_password(new)?;
        self.members.update_password_hash(id, &hash).await?;
        Ok(())
    }

    /// Withdraw the account. Refused while any order is still open.
    pub async fn withdraw(&self, id: MemberId, password: &str) -> Result<(), AuthError> {
        self.check_password(id, password).await?;

        if self.orders.count_in_progress(id).await? > 0 {
            return Err(AuthError::OrdersInProgress);
        }

        self.members.withdraw(id).await?;
        Ok(())
    }

    async fn check_password(&self, id: MemberId, password: &str) -> Result<(), AuthError> {
        let hash = self
            .members
            .get_password_hash(id)
            .await?
            .ok_or(AuthError::MemberNotFound)?;
        verify_password(password, &hash)
    }
}

fn required<'s>(value: &'s str, field: &'static str) -> Result<&'s str, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(value)
}

/// Validate password meets requirements.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if !password.chars().any(char::is_alphabetic) || !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "password must contain a letter and a digit".to_string(),
        ));
    }

    Ok(())
}

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password() {
        assert!(validate_password("filter2024").is_ok());
        assert!(matches!(
            validate_password("ab1"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("onlyletters"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("12345678"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("purewater1").unwrap();
        assert!(verify_password("purewater1", &hash).is_ok());
        assert!(matches!(
            verify_password("purewater2", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything1", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required("  Kim  ", "name").unwrap(), "Kim");
        assert!(matches!(
            required("   ", "name"),
            Err(AuthError::MissingField("name"))
        ));
    }
}
