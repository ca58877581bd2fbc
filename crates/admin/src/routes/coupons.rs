//! Coupon definitions and issuing.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};

use purewell_core::models::{Coupon, MemberCoupon};
use purewell_core::{CouponId, DiscountKind, MemberId, MemberStatus, Page, PageRequest};

use crate::db::coupons::{CouponInput, CouponRow};
use crate::db::{CouponRepository, MemberRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IssueRequest {
    pub member_id: MemberId,
}

/// GET /api/admin/coupons
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<CouponRow>>> {
    let (items, total) = CouponRepository::new(state.pool()).list(page).await?;
    Ok(Json(Page::new(items, page, total)))
}

/// POST /api/admin/coupons
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id, name = %input.name))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CouponInput>,
) -> Result<(StatusCode, Json<Coupon>)> {
    let input = validate(input)?;
    let coupon = CouponRepository::new(state.pool()).create(&input).await?;
    info!(coupon_id = %coupon.id, "Coupon created");
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// Issue a coupon to an active member.
///
/// POST /api/admin/coupons/{id}/issue
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, member_id = %req.member_id))]
pub async fn issue(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CouponId>,
    Json(req): Json<IssueRequest>,
) -> Result<(StatusCode, Json<MemberCoupon>)> {
    let coupons = CouponRepository::new(state.pool());
    coupons
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;

    let member = MemberRepository::new(state.pool())
        .get(req.member_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;
    if member.status != MemberStatus::Active {
        return Err(AppError::Conflict(format!(
            "Coupons can only be issued to active members (member is {})",
            member.status
        )));
    }

    let issued = coupons.issue(id, member.id).await?;
    info!(member_coupon_id = %issued.id, "Coupon issued");
    Ok((StatusCode::CREATED, Json(issued)))
}

/// Check coupon terms before they reach the table constraints.
fn validate(mut input: CouponInput) -> Result<CouponInput> {
    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
        return Err(AppError::BadRequest("Coupon name is required".to_string()));
    }
    if input.discount_value <= Decimal::ZERO || input.discount_value.fract() != Decimal::ZERO {
        return Err(AppError::BadRequest(
            "discount_value must be a positive whole number".to_string(),
        ));
    }
    if input.discount_kind == DiscountKind::Percent && input.discount_value > Decimal::ONE_HUNDRED {
        return Err(AppError::BadRequest(
            "A percentage discount cannot exceed 100".to_string(),
        ));
    }
    if input.max_discount.is_some_and(|m| m <= Decimal::ZERO) {
        return Err(AppError::BadRequest("max_discount must be positive".to_string()));
    }
    if input.min_order_amount.is_some_and(|m| m < Decimal::ZERO) {
        return Err(AppError::BadRequest(
            "min_order_amount cannot be negative".to_string(),
        ));
    }
    if let (Some(starts), Some(ends)) = (input.starts_at, input.ends_at)
        && ends <= starts
    {
        return Err(AppError::BadRequest("ends_at must be after starts_at".to_string()));
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn percent(value: i64) -> CouponInput {
        CouponInput {
            name: "Spring cartridge sale".to_string(),
            discount_kind: DiscountKind::Percent,
            discount_value: Decimal::from(value),
            max_discount: Some(Decimal::from(10_000)),
            min_order_amount: None,
            starts_at: None,
            ends_at: None,
        }
    }

    #[test]
    fn test_percent_range() {
        assert!(validate(percent(10)).is_ok());
        assert!(validate(percent(100)).is_ok());
        assert!(validate(percent(101)).is_err());
        assert!(validate(percent(0)).is_err());
    }

    #[test]
    fn test_fixed_amount_can_exceed_hundred() {
        let mut fixed = percent(5_000);
        fixed.discount_kind = DiscountKind::Fixed;
        assert!(validate(fixed).is_ok());
    }

    #[test]
    fn test_window_must_be_ordered() {
        let now = Utc::now();
        let mut input = percent(10);
        input.starts_at = Some(now);
        input.ends_at = Some(now - Duration::days(1));
        assert!(validate(input).is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut input = percent(10);
        input.name = "   ".to_string();
        assert!(validate(input).is_err());
    }
}
