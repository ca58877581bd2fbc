//! Dashboard.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::DashboardRepository;
use crate::db::dashboard::DashboardSummary;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// GET /api/admin/dashboard
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<DashboardSummary>> {
    let summary = DashboardRepository::new(state.pool())
        .summary(state.config().low_stock_threshold)
        .await?;
    Ok(Json(summary))
}
