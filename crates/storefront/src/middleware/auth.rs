//! Authentication extractors.
//!
//! Members are identified by the [`CurrentMember`] stored in the session at
//! sign-in. Every request re-reads the member's status, so an account that
//! was rejected, withdrawn or changed type loses its session at once.

use axum::{extract::FromRequestParts, http::request::Parts};
use purewell_core::{MemberStatus, MemberType};
use tower_sessions::Session;
use tracing::info;

use crate::db::MemberRepository;
use crate::error::AppError;
use crate::models::{CurrentMember, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in member.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(member): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", member.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentMember);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        signed_in_member(parts, state)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Sign in required".to_string()))
    }
}

/// Extractor that optionally gets the current member.
///
/// Guests get `None`; used where prices or carts differ per viewer.
pub struct OptionalAuth(pub Option<CurrentMember>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(signed_in_member(parts, state).await?))
    }
}

async fn signed_in_member(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<CurrentMember>, AppError> {
    // Set by SessionManagerLayer
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };

    let Some(member) = session
        .get::<CurrentMember>(session_keys::CURRENT_MEMBER)
        .await
        .ok()
        .flatten()
    else {
        return Ok(None);
    };

    let standing = MemberRepository::new(state.pool()).standing(member.id).await?;
    if session_still_valid(&member, standing) {
        return Ok(Some(member));
    }

    info!(member_id = %member.id, "Ending session of member who can no longer sign in");
    session.flush().await?;
    Ok(None)
}

/// A session stays valid while the account is active and its type (which
/// picks the price field) is unchanged.
fn session_still_valid(
    member: &CurrentMember,
    standing: Option<(MemberStatus, MemberType)>,
) -> bool {
    standing.is_some_and(|(status, member_type)| {
        status.can_login() && member_type == member.member_type
    })
}

/// Store the signed-in member in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
pub async fn set_current_member(
    session: &Session,
    member: &CurrentMember,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_MEMBER, member).await
}

/// Drop the whole session (logout, withdrawal).
pub async fn clear_current_member(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
