//! Sign-up, sign-in and sign-out.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use purewell_core::models::Member;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_member, set_current_member};
use crate::models::CurrentMember;
use crate::services::auth::{AuthService, Registration};
use crate::services::cart::CartService;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register a member.
///
/// POST /api/auth/register
///
/// Individuals can sign in straight away; corporate accounts come back with
/// `status: "pending"`.
#[instrument(skip(state, form), fields(email = %form.email, member_type = %form.member_type))]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<Registration>,
) -> Result<(StatusCode, Json<Member>)> {
    let member = AuthService::new(state.pool()).register(&form).await?;
    info!(member_id = %member.id, status = %member.status, "Member registered");
    Ok((StatusCode::CREATED, Json(member)))
}

/// Sign in. The guest cart is merged into the member cart.
///
/// POST /api/auth/login
#[instrument(skip(state, session, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Member>> {
    let member = AuthService::new(state.pool())
        .login(&req.email, &req.password)
        .await?;
    let current = CurrentMember::from(&member);

    CartService::new(state.pool())
        .merge_guest_cart(&session, &current)
        .await?;
    set_current_member(&session, &current).await?;
    set_sentry_user(&member.id, Some(member.email.as_str()));

    info!(member_id = %member.id, "Member signed in");
    Ok(Json(member))
}

/// Sign out.
///
/// POST /api/auth/logout
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_member(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in member, reloaded from the database.
///
/// GET /api/auth/me
#[instrument(skip(state, current), fields(member_id = %current.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Member>> {
    let member = AuthService::new(state.pool()).get_member(current.id).await?;
    Ok(Json(member))
}
