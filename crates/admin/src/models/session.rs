//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use purewell_core::{Email, MemberId};

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the logged-in admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// The admin's member ID.
    pub id: MemberId,
    pub email: Email,
    /// Display name.
    pub name: String,
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
