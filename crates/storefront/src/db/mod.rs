//! Database operations for the storefront.
//!
//! # Schema: `shop`
//!
//! Shared with the admin binary:
//!
//! - `member` - Accounts of every type, including admins
//! - `category`, `product` - Two-level catalog
//! - `cart_item` - Carts of signed-in members (guest carts live in the session)
//! - `coupon`, `member_coupon` - Coupon definitions and issued coupons
//! - `order`, `order_item` - Orders with price snapshots
//! - `point_transaction` - Point ledger
//! - `inquiry`, `notice` - Support board
//!
//! Sessions are stored by `tower-sessions-sqlx-store` in its own schema.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p purewell-cli -- migrate
//! ```

pub mod cart;
pub mod coupons;
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

pub use cart::CartRepository;
pub use coupons::CouponRepository;
pub use inquiries::InquiryRepository;
pub use members::MemberRepository;
pub use notices::NoticeRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in database is invalid or corrupted.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint or state conflict.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Map unique violations to `Conflict`, everything else to `Database`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
