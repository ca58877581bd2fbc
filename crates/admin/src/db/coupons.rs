//! Coupon definitions and issuing.

use chrono::{DateTime, Utc};
use purewell_core::models::{Coupon, MemberCoupon};
use purewell_core::{CouponId, DiscountKind, MemberId, PageRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{RepositoryError, conflict_on_constraint};

const COUPON_COLUMNS: &str = "id, name, discount_kind, discount_value, max_discount, \
     min_order_amount, starts_at, ends_at, created_at";

/// A new coupon definition.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponInput {
    pub name: String,
    pub discount_kind: DiscountKind,
    pub discount_value: Decimal,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
    #[serde(default)]
    pub min_order_amount: Option<Decimal>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// A coupon with how often it was issued and used.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CouponRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub coupon: Coupon,
    pub issued_count: i64,
    pub used_count: i64,
}

/// Repository for coupon administration.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Coupons, newest first, with issue counts.
    pub async fn list(&self, page: PageRequest) -> Result<(Vec<CouponRow>, i64), RepositoryError> {
        let coupons = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS}, \
                    (SELECT COUNT(*) FROM shop.member_coupon mc WHERE mc.coupon_id = c.id) \
                        AS issued_count, \
                    (SELECT COUNT(*) FROM shop.member_coupon mc \
                        WHERE mc.coupon_id = c.id AND mc.used_at IS NOT NULL) AS used_count \
             FROM shop.coupon c ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shop.coupon")
            .fetch_one(self.pool)
            .await?;

        Ok((coupons, total))
    }

    pub async fn get(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM shop.coupon WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(coupon)
    }

    /// Insert a coupon. The caller validates the terms.
    pub async fn create(&self, input: &CouponInput) -> Result<Coupon, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "INSERT INTO shop.coupon (name, discount_kind, discount_value, max_discount, \
             min_order_amount, starts_at, ends_at) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, now()), $7) RETURNING {COUPON_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(input.discount_kind)
        .bind(input.discount_value)
        .bind(input.max_discount)
        .bind(input.min_order_amount.unwrap_or(Decimal::ZERO))
        .bind(input.starts_at)
        .bind(input.ends_at)
        .fetch_one(self.pool)
        .await?;
        Ok(coupon)
    }

    /// Issue a coupon to a member.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the member or coupon is unknown.
    pub async fn issue(
        &self,
        coupon_id: CouponId,
        member_id: MemberId,
    ) -> Result<MemberCoupon, RepositoryError> {
        let issued = sqlx::query_as::<_, MemberCoupon>(
            "INSERT INTO shop.member_coupon (member_id, coupon_id) VALUES ($1, $2) \
             RETURNING id, member_id, coupon_id, issued_at, used_at, order_id",
        )
        .bind(member_id)
        .bind(coupon_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_constraint(e, "unknown member or coupon"))?;
        Ok(issued)
    }
}
