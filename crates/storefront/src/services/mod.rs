//! Business logic services for the storefront.
//!
//! - `auth` - Sign-up, sign-in and account changes (Argon2 passwords)
//! - `cart` - Guest and member carts with per-viewer prices
//! - `catalog` - Category tree cache and product views
//! - `checkout` - Quotes, orders, payment completion and cancellation

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
