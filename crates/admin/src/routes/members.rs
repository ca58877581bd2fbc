//! Member administration.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use purewell_core::models::{Member, Order, PointTransaction};
use purewell_core::{MemberId, MemberStatus, MemberType, Page, PageRequest};

use crate::db::members::{MemberFilter, POINTS_ADJUSTED};
use crate::db::{MemberRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

const RECENT_LIMIT: i64 = 10;

/// A member with the context an operator needs.
#[derive(Debug, Serialize)]
pub struct MemberDetail {
    #[serde(flatten)]
    pub member: Member,
    /// Branches, for a headquarters.
    pub branches: Vec<Member>,
    /// The parent account, for a branch.
    pub headquarters: Option<Member>,
    pub recent_orders: Vec<Order>,
    pub recent_points: Vec<PointTransaction>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: MemberStatus,
}

#[derive(Debug, Deserialize)]
pub struct PointsAdjustment {
    /// Positive to grant, negative to deduct.
    pub delta: Decimal,
    pub reason: Option<String>,
}

/// Adjusted balance with the ledger entry just written.
#[derive(Debug, Serialize)]
pub struct PointsAdjusted {
    pub member: Member,
    pub transaction: PointTransaction,
}

/// GET /api/admin/members
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(filter): Query<MemberFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Member>>> {
    let (items, total) = MemberRepository::new(state.pool())
        .list(&filter, page)
        .await?;
    Ok(Json(Page::new(items, page, total)))
}

/// GET /api/admin/members/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<MemberId>,
) -> Result<Json<MemberDetail>> {
    let members = MemberRepository::new(state.pool());
    let member = members
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

    let branches = if member.member_type == MemberType::Headquarters {
        members.branches_of(id).await?
    } else {
        Vec::new()
    };
    let headquarters = match member.headquarters_id {
        Some(hq) => members.get(hq).await?,
        None => None,
    };
    let recent_orders = OrderRepository::new(state.pool())
        .recent_for_member(id, RECENT_LIMIT)
        .await?;
    let recent_points = members.recent_point_transactions(id, RECENT_LIMIT).await?;

    Ok(Json(MemberDetail {
        member,
        branches,
        headquarters,
        recent_orders,
        recent_points,
    }))
}

/// Approve a pending headquarters or branch.
///
/// POST /api/admin/members/{id}/approve
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn approve(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<MemberId>,
) -> Result<Json<Member>> {
    decide(&state, id, MemberStatus::Active).await.map(Json)
}

/// POST /api/admin/members/{id}/reject
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn reject(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<MemberId>,
) -> Result<Json<Member>> {
    decide(&state, id, MemberStatus::Rejected).await.map(Json)
}

async fn decide(state: &AppState, id: MemberId, decision: MemberStatus) -> Result<Member> {
    let members = MemberRepository::new(state.pool());
    if let Some(member) = members.decide(id, decision).await? {
        info!(member_id = %member.id, status = %member.status, "Corporate member decided");
        return Ok(member);
    }

    match members.get(id).await? {
        Some(member) => Err(AppError::Conflict(format!(
            "Only pending corporate accounts can be approved or rejected (member is {} {})",
            member.status, member.member_type
        ))),
        None => Err(AppError::NotFound("Member not found".to_string())),
    }
}

/// Set a member's status directly, for suspensions and reinstatements.
///
/// PATCH /api/admin/members/{id}/status
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, status = %req.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<MemberId>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<Member>> {
    if id == admin.id {
        return Err(AppError::Conflict(
            "You cannot change your own account status".to_string(),
        ));
    }
    if req.status == MemberStatus::Pending {
        return Err(AppError::BadRequest(
            "A member cannot be moved back to pending".to_string(),
        ));
    }

    let member = MemberRepository::new(state.pool())
        .set_status(id, req.status)
        .await?;
    info!(member_id = %member.id, status = %member.status, "Member status updated");
    Ok(Json(member))
}

/// Grant or deduct points.
///
/// POST /api/admin/members/{id}/points
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, delta = %req.delta))]
pub async fn adjust_points(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<MemberId>,
    Json(req): Json<PointsAdjustment>,
) -> Result<Json<PointsAdjusted>> {
    validate_points_delta(req.delta)?;
    let reason = req
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(POINTS_ADJUSTED);

    let (member, transaction) = MemberRepository::new(state.pool())
        .adjust_points(id, req.delta, reason)
        .await?;
    info!(member_id = %member.id, balance = %member.points, "Points adjusted");
    Ok(Json(PointsAdjusted {
        member,
        transaction,
    }))
}

/// Point deltas are non-zero whole won.
fn validate_points_delta(delta: Decimal) -> Result<()> {
    if delta.is_zero() {
        return Err(AppError::BadRequest("delta must not be zero".to_string()));
    }
    if delta.fract() != Decimal::ZERO {
        return Err(AppError::BadRequest(
            "delta must be a whole number".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_delta_validation() {
        assert!(validate_points_delta(Decimal::from(500)).is_ok());
        assert!(validate_points_delta(Decimal::from(-500)).is_ok());
        assert!(validate_points_delta(Decimal::ZERO).is_err());
        assert!(validate_points_delta(Decimal::new(15, 1)).is_err());
    }
}
