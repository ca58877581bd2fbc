//! Member accounts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{Email, MemberId, MemberStatus, MemberType};

/// A registered member. The password hash is never part of this record.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Member {
    pub id: MemberId,
    pub email: Email,
    pub name: String,
    /// Hyphenated phone number.
    pub phone: String,
    pub member_type: MemberType,
    pub status: MemberStatus,
    /// Spendable point balance in won.
    pub points: Decimal,
    /// Company name (corporate accounts).
    pub business_name: Option<String>,
    /// Registration number without hyphens (corporate accounts).
    pub business_number: Option<String>,
    /// Representative's name (corporate accounts).
    pub representative: Option<String>,
    /// Parent headquarters (branch accounts).
    pub headquarters_id: Option<MemberId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.member_type, MemberType::Admin)
    }

    /// Whether `other` is a branch of this headquarters.
    #[must_use]
    pub fn is_headquarters_of(&self, other: &Self) -> bool {
        self.member_type == MemberType::Headquarters
            && other.member_type == MemberType::Branch
            && other.headquarters_id == Some(self.id)
    }
}
