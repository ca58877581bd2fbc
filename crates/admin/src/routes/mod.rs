//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/admin/auth/login                 - Sign in (active admin members only)
//! POST   /api/admin/auth/logout                - Sign out
//! GET    /api/admin/auth/me                    - Current admin or 401
//!
//! # Dashboard
//! GET    /api/admin/dashboard                  - Today, month to date, work queues
//!
//! # Members
//! GET    /api/admin/members                    - List (type, status, q)
//! GET    /api/admin/members/{id}               - Detail with branches, orders, points
//! POST   /api/admin/members/{id}/approve       - Approve a pending HQ or branch
//! POST   /api/admin/members/{id}/reject        - Reject a pending HQ or branch
//! PATCH  /api/admin/members/{id}/status        - Set status
//! POST   /api/admin/members/{id}/points        - Grant or deduct points
//!
//! # Catalog
//! GET    /api/admin/categories                 - Category tree
//! POST   /api/admin/categories                 - Create a main or sub category
//! PUT    /api/admin/categories/{id}            - Rename or reorder
//! DELETE /api/admin/categories/{id}            - Delete an unused category
//! GET    /api/admin/products                   - List (all statuses)
//! POST   /api/admin/products                   - Create
//! GET    /api/admin/products/{id}              - Detail
//! PUT    /api/admin/products/{id}              - Update
//! DELETE /api/admin/products/{id}              - Delete, or hide if ever ordered
//! POST   /api/admin/products/{id}/stock        - Adjust stock
//!
//! # Orders
//! GET    /api/admin/orders                     - List (status, from, to, q)
//! GET    /api/admin/orders/{id}                - Detail with items
//! PATCH  /api/admin/orders/{id}/status         - Advance fulfilment
//! POST   /api/admin/orders/{id}/cancel         - Cancel or refund in full
//!
//! # Support
//! GET    /api/admin/inquiries                  - List (kind, status)
//! GET    /api/admin/inquiries/{id}             - Detail
//! POST   /api/admin/inquiries/{id}/answer      - Answer, optionally approving a refund
//! POST   /api/admin/inquiries/{id}/close       - Close
//! GET    /api/admin/notices                    - List a board (kind)
//! POST   /api/admin/notices                    - Post
//! GET    /api/admin/notices/{id}               - Detail
//! PUT    /api/admin/notices/{id}               - Edit
//! DELETE /api/admin/notices/{id}               - Delete
//! POST   /api/admin/notices/{id}/pin           - Pin or unpin
//!
//! # Coupons
//! GET    /api/admin/coupons                    - List with issue counts
//! POST   /api/admin/coupons                    - Create
//! POST   /api/admin/coupons/{id}/issue         - Issue to a member
//! ```

pub mod auth;
pub mod categories;
pub mod coupons;
pub mod dashboard;
pub mod inquiries;
pub mod members;
pub mod notices;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::state::AppState;

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(members::list))
        .route("/{id}", get(members::show))
        .route("/{id}/approve", post(members::approve))
        .route("/{id}/reject", post(members::reject))
        .route("/{id}/status", patch(members::update_status))
        .route("/{id}/points", post(members::adjust_points))
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/{id}",
            put(categories::update).delete(categories::delete),
        )
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/products/{id}/stock", post(products::adjust_stock))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", patch(orders::update_status))
        .route("/{id}/cancel", post(orders::cancel))
}

fn support_routes() -> Router<AppState> {
    Router::new()
        .route("/inquiries", get(inquiries::list))
        .route("/inquiries/{id}", get(inquiries::show))
        .route("/inquiries/{id}/answer", post(inquiries::answer))
        .route("/inquiries/{id}/close", post(inquiries::close))
        .route("/notices", get(notices::list).post(notices::create))
        .route(
            "/notices/{id}",
            get(notices::show)
                .put(notices::update)
                .delete(notices::delete),
        )
        .route("/notices/{id}/pin", post(notices::pin))
}

fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(coupons::list).post(coupons::create))
        .route("/{id}/issue", post(coupons::issue))
}

/// Build the complete admin router.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes())
        .route("/dashboard", get(dashboard::show))
        .nest("/members", member_routes())
        .merge(catalog_routes())
        .nest("/orders", order_routes())
        .merge(support_routes())
        .nest("/coupons", coupon_routes());

    Router::new().nest("/api/admin", api)
}
