//! Coupon definitions and issued coupons.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::checkout::CouponTerms;
use crate::types::{CouponId, DiscountKind, MemberCouponId, MemberId, OrderId};

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Coupon {
    pub id: CouponId,
    pub name: String,
    pub discount_kind: DiscountKind,
    /// Won amount or percentage, depending on `discount_kind`.
    pub discount_value: Decimal,
    /// Cap for percentage coupons.
    pub max_discount: Option<Decimal>,
    pub min_order_amount: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    #[must_use]
    pub const fn terms(&self) -> CouponTerms {
        CouponTerms {
            kind: self.discount_kind,
            value: self.discount_value,
            max_discount: self.max_discount,
            min_order_amount: self.min_order_amount,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        }
    }
}

/// A coupon issued to one member. Used at most once.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct MemberCoupon {
    pub id: MemberCouponId,
    pub member_id: MemberId,
    pub coupon_id: CouponId,
    pub issued_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub order_id: Option<OrderId>,
}

/// An issued coupon joined with its definition, as listed to the member.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct IssuedCoupon {
    pub id: MemberCouponId,
    pub coupon_id: CouponId,
    pub name: String,
    pub discount_kind: DiscountKind,
    pub discount_value: Decimal,
    pub max_discount: Option<Decimal>,
    pub min_order_amount: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub issued_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl IssuedCoupon {
    #[must_use]
    pub const fn terms(&self) -> CouponTerms {
        CouponTerms {
            kind: self.discount_kind,
            value: self.discount_value,
            max_discount: self.max_discount,
            min_order_amount: self.min_order_amount,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        }
    }

    /// Unused and inside its validity window.
    #[must_use]
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.terms().is_active(now)
    }
}
