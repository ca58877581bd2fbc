//! Headquarters tools: branch approval and branch orders.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::{info, instrument};

use purewell_core::models::Member;
use purewell_core::{MemberId, MemberStatus, Page, PageRequest};

use crate::db::orders::BranchOrder;
use crate::db::{MemberRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::CurrentMember;
use crate::state::AppState;

fn require_headquarters(member: &CurrentMember) -> Result<()> {
    if member.is_headquarters() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only headquarters accounts can manage branches".to_string(),
        ))
    }
}

/// Branches of the signed-in headquarters, pending first.
///
/// GET /api/corporate/branches
#[instrument(skip_all, fields(member_id = %member.id))]
pub async fn branches(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
) -> Result<Json<Vec<Member>>> {
    require_headquarters(&member)?;
    let branches = MemberRepository::new(state.pool())
        .list_branches(member.id)
        .await?;
    Ok(Json(branches))
}

/// POST /api/corporate/branches/{id}/approve
#[instrument(skip(state, member), fields(member_id = %member.id))]
pub async fn approve_branch(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Path(branch_id): Path<MemberId>,
) -> Result<Json<Member>> {
    decide(&state, &member, branch_id, MemberStatus::Active).await
}

/// POST /api/corporate/branches/{id}/reject
#[instrument(skip(state, member), fields(member_id = %member.id))]
pub async fn reject_branch(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Path(branch_id): Path<MemberId>,
) -> Result<Json<Member>> {
    decide(&state, &member, branch_id, MemberStatus::Rejected).await
}

async fn decide(
    state: &AppState,
    member: &CurrentMember,
    branch_id: MemberId,
    status: MemberStatus,
) -> Result<Json<Member>> {
    require_headquarters(member)?;
    let branch = MemberRepository::new(state.pool())
        .decide_branch(member.id, branch_id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("No pending branch with that id".to_string()))?;
    info!(branch_id = %branch.id, %status, "Branch decided");
    Ok(Json(branch))
}

/// Orders placed by all branches of the signed-in headquarters.
///
/// GET /api/corporate/orders
#[instrument(skip_all, fields(member_id = %member.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<BranchOrder>>> {
    require_headquarters(&member)?;
    let (orders, total) = OrderRepository::new(state.pool())
        .list_for_headquarters(member.id, page)
        .await?;
    Ok(Json(Page::new(orders, page, total)))
}
