//! Core types for Purewell.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod business_number;
pub mod email;
pub mod id;
pub mod phone;
pub mod price;
pub mod status;

pub use business_number::{BusinessNumber, BusinessNumberError};
pub use email::{Email, EmailError};
pub use id::*;
pub use phone::{PhoneNumber, PhoneNumberError};
pub use price::{CurrencyCode, Price};
pub use status::*;
