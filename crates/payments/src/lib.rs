//! Purewell Payments - payment gateway integration.
//!
//! Talks to the `PortOne` (formerly iamport) v1 REST API. The browser SDK opens
//! the payment window using the order number as `merchant_uid`; the server
//! then looks the payment up by `imp_uid` and compares it against the order
//! before anything is committed.
//!
//! # API Reference
//!
//! - Base URL: `https://api.iamport.kr`
//! - Authentication: `POST /users/getToken` with the REST API key and secret,
//!   then the token in the `Authorization` header
//! - Every response is wrapped in `{ code, message, response }`; `code != 0`
//!   is a gateway-level failure even on HTTP 200

#![cfg_attr(not(test), forbid(unsafe_code))]

mod client;
mod config;
mod error;
mod types;
mod webhook;

pub use client::PaymentClient;
pub use config::{DEFAULT_BASE_URL, PaymentConfig};
pub use error::PaymentError;
pub use types::{CancelRequest, GatewayPayment, PaymentStatus, WebhookNotification};
pub use webhook::verify_webhook_signature;
