//! Database operations for the admin API.
//!
//! # Schema: `shop` (shared with the storefront)
//!
//! The admin binary reads every table and is the only writer of catalog,
//! coupon and notice rows. Order reversals here mirror the storefront's
//! customer cancellation so stock, coupons and points always move together.
//!
//! Admin sessions live in `admin.session` (created by `pw-cli migrate`).

pub mod categories;
pub mod coupons;
pub mod dashboard;
pub mod inquiries;
pub mod members;
pub mod notices;
pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use coupons::CouponRepository;
pub use dashboard::DashboardRepository;
pub use inquiries::InquiryRepository;
pub use members::MemberRepository;
pub use notices::NoticeRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation or a state that forbids the change.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map unique and foreign-key violations to `Conflict`.
pub(crate) fn conflict_on_constraint(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// `%term%` for `ILIKE`, with the pattern metacharacters escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" RO "), "%RO%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
