//! Account self-service: profile, password, withdrawal, points and coupons.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use purewell_core::models::{IssuedCoupon, Member, PointTransaction};
use purewell_core::{Page, PageRequest};

use crate::db::{CouponRepository, MemberRepository};
use crate::error::{Result, clear_sentry_user};
use crate::middleware::{RequireAuth, clear_current_member};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Profile update body.
#[derive(Debug, Deserialize)]
pub struct UpdateProfile {
    pub name: String,
    pub phone: String,
}

/// Password change body.
#[derive(Debug, Deserialize)]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

/// Withdrawal body.
#[derive(Debug, Deserialize)]
pub struct Withdraw {
    pub password: String,
}

/// Point balance with one page of the ledger.
#[derive(Debug, Serialize)]
pub struct PointsView {
    pub balance: Decimal,
    pub history: Page<PointTransaction>,
}

/// GET /api/account
#[instrument(skip_all, fields(member_id = %member.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
) -> Result<Json<Member>> {
    let member = AuthService::new(state.pool()).get_member(member.id).await?;
    Ok(Json(member))
}

/// PATCH /api/account
#[instrument(skip_all, fields(member_id = %member.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Json(form): Json<UpdateProfile>,
) -> Result<Json<Member>> {
    let updated = AuthService::new(state.pool())
        .update_profile(member.id, &form.name, &form.phone)
        .await?;
    Ok(Json(updated))
}

/// POST /api/account/password
#[instrument(skip_all, fields(member_id = %member.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Json(form): Json<ChangePassword>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .change_password(member.id, &form.current_password, &form.new_password)
        .await?;
    info!("Password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// Withdraw the account and end the session.
///
/// POST /api/account/withdraw
#[instrument(skip_all, fields(member_id = %member.id))]
pub async fn withdraw(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(member): RequireAuth,
    Json(form): Json<Withdraw>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .withdraw(member.id, &form.password)
        .await?;
    clear_current_member(&session).await?;
    clear_sentry_user();
    info!("Member withdrew");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/account/points
#[instrument(skip_all, fields(member_id = %member.id))]
pub async fn points(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Query(page): Query<PageRequest>,
) -> Result<Json<PointsView>> {
    let members = MemberRepository::new(state.pool());
    let balance = members.points_balance(member.id).await?;
    let (items, total) = members.list_point_transactions(member.id, page).await?;
    Ok(Json(PointsView {
        balance,
        history: Page::new(items, page, total),
    }))
}

/// Coupons that can be applied right now.
///
/// GET /api/account/coupons
#[instrument(skip_all, fields(member_id = %member.id))]
pub async fn coupons(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
) -> Result<Json<Vec<IssuedCoupon>>> {
    let coupons = CouponRepository::new(state.pool())
        .list_usable(member.id, Utc::now())
        .await?;
    Ok(Json(coupons))
}
