//! Integration tests for Purewell.
//!
//! # Running Tests
//!
//! ```bash
//! # Library-level tests run anywhere
//! cargo test -p purewell-integration-tests
//!
//! # Black-box API tests need both servers, a migrated database with the
//! # example catalog seeded, and an admin account
//! pw-cli migrate
//! pw-cli seed catalog crates/cli/data/catalog.example.yaml
//! PUREWELL_ADMIN_PASSWORD=... pw-cli admin create -e ops@purewell.test -n Ops
//! ADMIN_TEST_EMAIL=ops@purewell.test PUREWELL_ADMIN_PASSWORD=... \
//!     cargo test -p purewell-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_api` - Storefront API, black-box over HTTP
//! - `admin_api` - Admin API, black-box over HTTP
//! - `checkout_rules` - Pricing, checkout and order lifecycle rules
//! - `order_lifecycle` - Points orders, cancellation, session revocation and
//!   webhook signatures across both servers

use reqwest::Client;
use serde_json::{Value, json};

/// Base URL for the storefront API (configurable via environment).
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin API (configurable via environment).
#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_TEST_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A client that keeps the session cookie between requests.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A fresh address so tests never collide with earlier runs.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@purewell.test", uuid::Uuid::new_v4().simple())
}

/// Registration body for an individual member.
#[must_use]
pub fn individual_registration(email: &str, password: &str) -> Value {
    json!({
        "email": email,
        "password": password,
        "name": "Test Shopper",
        "phone": "010-1234-5678",
        "member_type": "individual",
    })
}

/// Sign the client in as the configured test admin.
///
/// # Panics
///
/// Panics if `ADMIN_TEST_EMAIL` or `PUREWELL_ADMIN_PASSWORD` is unset, or the
/// login is refused.
pub async fn sign_in_admin(client: &Client) {
    let email = std::env::var("ADMIN_TEST_EMAIL").expect("ADMIN_TEST_EMAIL not set");
    let password =
        std::env::var("PUREWELL_ADMIN_PASSWORD").expect("PUREWELL_ADMIN_PASSWORD not set");

    let resp = client
        .post(format!("{}/api/admin/auth/login", admin_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to reach admin login");
    assert!(
        resp.status().is_success(),
        "admin login failed: {}",
        resp.status()
    );
}
