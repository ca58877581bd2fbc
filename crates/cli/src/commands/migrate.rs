//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! pw-cli migrate
//! ```
//!
//! Applies `crates/storefront/migrations` (schema `shop`) and creates the two
//! session tables: `tower_sessions.session` for shoppers and `admin.session`
//! for the back office. Safe to run repeatedly.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use purewell_admin::db;
use purewell_admin::middleware::session::{SESSION_SCHEMA, SESSION_TABLE};
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use super::MissingEnvVar;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVar),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid session store name: {0}")]
    SessionStore(String),
}

/// Run schema migrations, then create the session stores.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = super::database_url()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running shop migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Creating storefront session store...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Creating admin session store...");
    PostgresStore::new(pool.clone())
        .with_schema_name(SESSION_SCHEMA)
        .map_err(MigrationError::SessionStore)?
        .with_table_name(SESSION_TABLE)
        .map_err(MigrationError::SessionStore)?
        .migrate()
        .await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
