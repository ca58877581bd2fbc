//! Notice and FAQ boards.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, instrument};

use purewell_core::models::Notice;
use purewell_core::{NoticeId, NoticeKind, Page, PageRequest};

use crate::db::NoticeRepository;
use crate::db::notices::NoticeInput;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    #[serde(default)]
    pub kind: NoticeKind,
}

#[derive(Debug, Deserialize)]
pub struct PinRequest {
    pub pinned: bool,
}

/// GET /api/admin/notices
#[instrument(skip_all, fields(admin_id = %admin.id, kind = %board.kind))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(board): Query<BoardQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Notice>>> {
    let (items, total) = NoticeRepository::new(state.pool())
        .list(board.kind, page)
        .await?;
    Ok(Json(Page::new(items, page, total)))
}

/// GET /api/admin/notices/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<NoticeId>,
) -> Result<Json<Notice>> {
    let notice = NoticeRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notice not found".to_string()))?;
    Ok(Json(notice))
}

/// POST /api/admin/notices
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id, kind = %input.kind))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<NoticeInput>,
) -> Result<(StatusCode, Json<Notice>)> {
    let input = validate(input)?;
    let notice = NoticeRepository::new(state.pool()).create(&input).await?;
    info!(notice_id = %notice.id, "Notice posted");
    Ok((StatusCode::CREATED, Json(notice)))
}

/// PUT /api/admin/notices/{id}
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<NoticeId>,
    Json(input): Json<NoticeInput>,
) -> Result<Json<Notice>> {
    let input = validate(input)?;
    let notice = NoticeRepository::new(state.pool()).update(id, &input).await?;
    Ok(Json(notice))
}

/// POST /api/admin/notices/{id}/pin
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, pinned = req.pinned))]
pub async fn pin(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<NoticeId>,
    Json(req): Json<PinRequest>,
) -> Result<Json<Notice>> {
    let notice = NoticeRepository::new(state.pool())
        .set_pinned(id, req.pinned)
        .await?;
    Ok(Json(notice))
}

/// DELETE /api/admin/notices/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<NoticeId>,
) -> Result<StatusCode> {
    NoticeRepository::new(state.pool()).delete(id).await?;
    info!(notice_id = %id, "Notice deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn validate(mut input: NoticeInput) -> Result<NoticeInput> {
    input.title = input.title.trim().to_string();
    input.body = input.body.trim().to_string();
    if input.title.is_empty() || input.body.is_empty() {
        return Err(AppError::BadRequest("Title and body are required".to_string()));
    }
    if input.title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::BadRequest(format!(
            "Title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(input)
}
