//! Inquiries (including refund and exchange requests) and the notice board.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, instrument};

use purewell_core::models::{Inquiry, Notice};
use purewell_core::{InquiryId, InquiryKind, NoticeId, NoticeKind, Page, PageRequest};

use crate::db::{InquiryRepository, NoticeRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Longest accepted inquiry title, prefix included.
const MAX_TITLE_CHARS: usize = 200;

/// New inquiry body.
#[derive(Debug, Deserialize)]
pub struct CreateInquiry {
    #[serde(default)]
    pub kind: InquiryKind,
    /// Required for refund and exchange requests.
    pub order_number: Option<String>,
    pub title: String,
    pub body: String,
}

/// Notice listing filter.
#[derive(Debug, Deserialize)]
pub struct NoticeQuery {
    #[serde(default)]
    pub kind: NoticeKind,
}

/// GET /api/inquiries
#[instrument(skip_all, fields(member_id = %member.id))]
pub async fn list_inquiries(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Inquiry>>> {
    let (items, total) = InquiryRepository::new(state.pool())
        .list(member.id, page)
        .await?;
    Ok(Json(Page::new(items, page, total)))
}

/// Open an inquiry.
///
/// POST /api/inquiries
///
/// Refund and exchange requests must name one of the member's own orders
/// that has been paid; their title gets the kind prefix.
#[instrument(skip(state, member, req), fields(member_id = %member.id, kind = %req.kind))]
pub async fn create_inquiry(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Json(req): Json<CreateInquiry>,
) -> Result<(StatusCode, Json<Inquiry>)> {
    let title = req.title.trim();
    let body = req.body.trim();
    if title.is_empty() || body.is_empty() {
        return Err(AppError::BadRequest("Title and body are required".to_string()));
    }

    let order_id = if req.kind.requires_order() {
        let number = req
            .order_number
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("order_number is required".to_string()))?;
        let order = OrderRepository::new(state.pool())
            .find_by_number(number)
            .await?
            .filter(|o| o.member_id == member.id)
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        if !order.status.is_paid() {
            return Err(AppError::Conflict(format!(
                "A {} request cannot be made for a {} order",
                req.kind, order.status
            )));
        }
        Some(order.id)
    } else {
        None
    };

    let title = req.kind.with_prefix(title);
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::BadRequest(format!(
            "Title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }

    let inquiry = InquiryRepository::new(state.pool())
        .create(member.id, req.kind, order_id, &title, body)
        .await?;
    info!(inquiry_id = %inquiry.id, "Inquiry created");
    Ok((StatusCode::CREATED, Json(inquiry)))
}

/// GET /api/inquiries/{id}
#[instrument(skip(state, member), fields(member_id = %member.id))]
pub async fn show_inquiry(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Path(id): Path<InquiryId>,
) -> Result<Json<Inquiry>> {
    let inquiry = InquiryRepository::new(state.pool())
        .get(member.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Inquiry not found".to_string()))?;
    Ok(Json(inquiry))
}

/// Delete an inquiry that has not been answered yet.
///
/// DELETE /api/inquiries/{id}
#[instrument(skip(state, member), fields(member_id = %member.id))]
pub async fn delete_inquiry(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Path(id): Path<InquiryId>,
) -> Result<StatusCode> {
    let inquiries = InquiryRepository::new(state.pool());
    if inquiries.delete_open(member.id, id).await? {
        return Ok(StatusCode::NO_CONTENT);
    }

    match inquiries.get(member.id, id).await? {
        Some(_) => Err(AppError::Conflict(
            "Answered inquiries cannot be deleted".to_string(),
        )),
        None => Err(AppError::NotFound("Inquiry not found".to_string())),
    }
}

/// GET /api/notices?kind=notice|faq&page=
#[instrument(skip(state))]
pub async fn list_notices(
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Notice>>> {
    let (items, total) = NoticeRepository::new(state.pool())
        .list(query.kind, page)
        .await?;
    Ok(Json(Page::new(items, page, total)))
}

/// GET /api/notices/{id}
#[instrument(skip(state))]
pub async fn show_notice(
    State(state): State<AppState>,
    Path(id): Path<NoticeId>,
) -> Result<Json<Notice>> {
    let notice = NoticeRepository::new(state.pool())
        .view(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notice not found".to_string()))?;
    Ok(Json(notice))
}
