//! Issued coupons for the signed-in member.

use chrono::{DateTime, Utc};
use purewell_core::models::IssuedCoupon;
use purewell_core::{MemberCouponId, MemberId};
use sqlx::PgPool;

use super::RepositoryError;

const ISSUED_SELECT: &str = "SELECT mc.id, mc.coupon_id, c.name, c.discount_kind, \
     c.discount_value, c.max_discount, c.min_order_amount, c.starts_at, c.ends_at, \
     mc.issued_at, mc.used_at \
     FROM shop.member_coupon mc JOIN shop.coupon c ON c.id = mc.coupon_id";

/// Repository for coupon reads.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Unused coupons inside their validity window, soonest expiry first.
    pub async fn list_usable(
        &self,
        member_id: MemberId,
        now: DateTime<Utc>,
    ) -> Result<Vec<IssuedCoupon>, RepositoryError> {
        let coupons = sqlx::query_as::<_, IssuedCoupon>(&format!(
            "{ISSUED_SELECT} WHERE mc.member_id = $1 AND mc.used_at IS NULL \
             AND c.starts_at <= $2 AND (c.ends_at IS NULL OR c.ends_at > $2) \
             ORDER BY c.ends_at NULLS LAST, mc.issued_at"
        ))
        .bind(member_id)
        .bind(now)
        .fetch_all(self.pool)
        .await?;
        Ok(coupons)
    }

    /// An issued coupon owned by `member_id`, used or not.
    pub async fn get_issued(
        &self,
        member_id: MemberId,
        id: MemberCouponId,
    ) -> Result<Option<IssuedCoupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, IssuedCoupon>(&format!(
            "{ISSUED_SELECT} WHERE mc.id = $1 AND mc.member_id = $2"
        ))
        .bind(id)
        .bind(member_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(coupon)
    }
}
