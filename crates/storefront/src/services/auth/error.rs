//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication and account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] purewell_core::EmailError),

    /// Invalid phone number.
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] purewell_core::PhoneNumberError),

    /// Invalid business registration number.
    #[error("invalid business number: {0}")]
    InvalidBusinessNumber(#[from] purewell_core::BusinessNumberError),

    /// A field required for this member type was missing.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Member type cannot be chosen at sign-up.
    #[error("cannot register as {0}")]
    InvalidMemberType(purewell_core::MemberType),

    /// Invalid credentials (wrong password or member not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Member not found.
    #[error("member not found")]
    MemberNotFound,

    /// Email or business number already registered.
    #[error("member already exists")]
    MemberAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Account is waiting for approval.
    #[error("account is pending approval")]
    AccountPending,

    /// Account approval was refused.
    #[error("account was rejected")]
    AccountRejected,

    /// No active headquarters has the given business number.
    #[error("headquarters not found")]
    HeadquartersNotFound,

    /// Withdrawal refused while orders are still open.
    #[error("orders are still in progress")]
    OrdersInProgress,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
