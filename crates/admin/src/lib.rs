//! Purewell Admin library.
//!
//! The back-office JSON API as a library, so handlers and services can be
//! tested without the binary.
//!
//! # Security
//!
//! This crate holds elevated access:
//! - Write access to the catalog, orders, coupons and notices
//! - Payment gateway cancellations on behalf of any member
//! - Member status and point balances

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
