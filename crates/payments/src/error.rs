//! Payment gateway errors.

use thiserror::Error;

/// Errors that can occur when interacting with the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status without a gateway envelope.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The gateway answered with a non-zero `code`.
    #[error("gateway error {code}: {message}")]
    Gateway { code: i32, message: String },

    /// API key or secret rejected.
    #[error("Unauthorized: invalid API credentials")]
    Unauthorized,

    /// Payment not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Webhook signature missing, stale or wrong.
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),
}
