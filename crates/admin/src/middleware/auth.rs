//! Authentication extractors for admin.
//!
//! The session holds a [`CurrentAdmin`] snapshot from sign-in. Each request
//! re-reads the account, so a deactivated or demoted admin is signed out on
//! their next request.

use axum::{extract::FromRequestParts, http::request::Parts};
use purewell_core::{MemberStatus, MemberType};
use tower_sessions::Session;
use tracing::info;

use crate::db::MemberRepository;
use crate::error::AppError;
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in admin.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let signed_out = || AppError::Unauthorized("Admin sign in required".to_string());

        let session = parts.extensions.get::<Session>().ok_or_else(signed_out)?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or_else(signed_out)?;

        let standing = MemberRepository::new(state.pool()).standing(admin.id).await?;
        if !still_admin(standing) {
            info!(admin_id = %admin.id, "Ending session of deactivated admin");
            session.flush().await?;
            return Err(signed_out());
        }

        Ok(Self(admin))
    }
}

fn still_admin(standing: Option<(MemberStatus, MemberType)>) -> bool {
    matches!(standing, Some((status, MemberType::Admin)) if status.can_login())
}

/// Store the signed-in admin in the session, under a fresh session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Drop the whole session (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_active_admins_stay_signed_in() {
        assert!(still_admin(Some((MemberStatus::Active, MemberType::Admin))));
        assert!(!still_admin(Some((MemberStatus::Withdrawn, MemberType::Admin))));
        assert!(!still_admin(Some((MemberStatus::Rejected, MemberType::Admin))));
        assert!(!still_admin(Some((MemberStatus::Active, MemberType::Individual))));
        assert!(!still_admin(None));
    }
}
