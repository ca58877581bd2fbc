//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (rate limited)
//! POST   /api/auth/register                    - Sign up (individual, HQ or branch)
//! POST   /api/auth/login                       - Sign in, merges the guest cart
//! POST   /api/auth/logout                      - Sign out
//! GET    /api/auth/me                          - Current member or 401
//!
//! # Account (requires auth)
//! GET    /api/account                          - Profile
//! PATCH  /api/account                          - Update profile
//! POST   /api/account/password                 - Change password (rate limited)
//! POST   /api/account/withdraw                 - Close the account
//! GET    /api/account/points                   - Balance and ledger
//! GET    /api/account/coupons                  - Usable coupons
//!
//! # Corporate (headquarters only)
//! GET    /api/corporate/branches               - Branch accounts
//! POST   /api/corporate/branches/{id}/approve  - Approve a pending branch
//! POST   /api/corporate/branches/{id}/reject   - Reject a pending branch
//! GET    /api/corporate/orders                 - Orders placed by branches
//!
//! # Catalog
//! GET    /api/categories                       - Category tree
//! GET    /api/products                         - Product listing
//! GET    /api/products/{id}                    - Product detail
//!
//! # Cart (guest or member)
//! GET    /api/cart                             - Cart contents
//! DELETE /api/cart                             - Empty the cart
//! POST   /api/cart/items                       - Add a product
//! PATCH  /api/cart/items/{product_id}          - Set a quantity
//! DELETE /api/cart/items/{product_id}          - Remove a product
//!
//! # Checkout
//! POST   /api/checkout/quote                   - Price the cart
//! POST   /api/checkout                         - Place a pending order
//! POST   /api/checkout/complete                - Confirm a payment
//! POST   /api/payments/webhook                 - Gateway notification
//!
//! # Orders (requires auth)
//! GET    /api/orders                           - Order history
//! GET    /api/orders/{order_number}            - Order detail
//! POST   /api/orders/{order_number}/cancel     - Cancel an order
//!
//! # Support
//! GET    /api/inquiries                        - Own inquiries
//! POST   /api/inquiries                        - Open an inquiry
//! GET    /api/inquiries/{id}                   - Inquiry detail
//! DELETE /api/inquiries/{id}                   - Delete an unanswered inquiry
//! GET    /api/notices                          - Notices and FAQ
//! GET    /api/notices/{id}                     - Notice detail
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod corporate;
pub mod orders;
pub mod support;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter())
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/password", post(account::change_password))
        .layer(auth_rate_limiter())
        .route("/", get(account::show).patch(account::update))
        .route("/withdraw", post(account::withdraw))
        .route("/points", get(account::points))
        .route("/coupons", get(account::coupons))
}

/// Create the corporate routes router.
pub fn corporate_routes() -> Router<AppState> {
    Router::new()
        .route("/branches", get(corporate::branches))
        .route("/branches/{id}/approve", post(corporate::approve_branch))
        .route("/branches/{id}/reject", post(corporate::reject_branch))
        .route("/orders", get(corporate::orders))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            axum::routing::patch(cart::update).delete(cart::remove),
        )
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::place_order))
        .route("/quote", post(checkout::quote))
        .route("/complete", post(checkout::complete))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list))
        .route("/{order_number}", get(orders::show))
        .route("/{order_number}/cancel", post(orders::cancel))
}

/// Create the inquiry and notice routes router.
pub fn support_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/inquiries",
            get(support::list_inquiries).post(support::create_inquiry),
        )
        .route(
            "/inquiries/{id}",
            get(support::show_inquiry).delete(support::delete_inquiry),
        )
        .route("/notices", get(support::list_notices))
        .route("/notices/{id}", get(support::show_notice))
}

/// Create all routes for the storefront.
///
/// The payment webhook sits outside the general API rate limiter; gateway
/// retries come from a handful of addresses.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .nest("/corporate", corporate_routes())
        .route("/categories", get(catalog::categories))
        .route("/products", get(catalog::products))
        .route("/products/{id}", get(catalog::product))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .merge(support_routes())
        .layer(api_rate_limiter());

    Router::new()
        .nest("/api", api)
        .route("/api/payments/webhook", post(checkout::webhook))
}
