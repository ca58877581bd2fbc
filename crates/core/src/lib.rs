//! Purewell Core - Shared types library.
//!
//! This crate provides common types used across all Purewell components:
//! - `storefront` - Customer-facing JSON API
//! - `admin` - Back-office JSON API
//! - `cli` - Command-line tools for migrations and catalog management
//!
//! # Architecture
//!
//! The core crate contains types and pure functions. Anything that decides a
//! price or an amount lives here so both binaries compute it the same way.
//! The one exception is `reversal` (behind the `postgres` feature): undoing
//! a paid order touches stock, coupons and points, and both binaries must
//! undo them identically.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, phone numbers, business
//!   registration numbers, prices and statuses
//! - [`models`] - Entity records shared by the storefront and admin APIs
//! - [`pricing`] - Role-based price field selection
//! - [`checkout`] - Coupon, point and shipping arithmetic
//! - [`pagination`] - Page request/response envelopes
//! - `reversal` - Locked, transactional reversal of paid orders (`postgres`)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod models;
pub mod pagination;
pub mod pricing;
#[cfg(feature = "postgres")]
pub mod reversal;
pub mod types;

pub use checkout::{CheckoutError, CheckoutLine, CheckoutPolicy, CheckoutQuote, CouponTerms};
pub use pagination::{Page, PageRequest};
pub use pricing::PriceView;
pub use types::*;
