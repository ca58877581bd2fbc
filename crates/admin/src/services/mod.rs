//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - password sign-in for admin members
//! - `email` - member notifications via SMTP
//! - `orders` - fulfilment status, cancellation and refunds

pub mod auth;
pub mod email;
pub mod orders;

pub use auth::{AdminAuthError, AdminAuthService};
pub use email::{EmailError, EmailService};
pub use orders::OrderService;
