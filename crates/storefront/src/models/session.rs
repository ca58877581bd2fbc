//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use purewell_core::models::Member;
use purewell_core::{Email, MemberId, MemberType};

/// Session-stored member identity.
///
/// Minimal data stored in the session to identify the signed-in member.
/// Approval status is checked at sign-in only; withdrawing clears the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentMember {
    /// Member's database ID.
    pub id: MemberId,
    /// Member's email address.
    pub email: Email,
    pub name: String,
    /// Selects the price field and the reachable endpoints.
    pub member_type: MemberType,
}

impl CurrentMember {
    #[must_use]
    pub const fn is_headquarters(&self) -> bool {
        matches!(self.member_type, MemberType::Headquarters)
    }
}

impl From<&Member> for CurrentMember {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            email: member.email.clone(),
            name: member.name.clone(),
            member_type: member.member_type,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current signed-in member.
    pub const CURRENT_MEMBER: &str = "current_member";

    /// Key for the guest cart.
    pub const GUEST_CART: &str = "guest_cart";
}
