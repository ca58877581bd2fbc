//! Inquiry handling, including refund approvals.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use purewell_core::models::Order;
use purewell_core::{InquiryId, InquiryKind, InquiryStatus, OrderId, Page, PageRequest};

use crate::db::InquiryRepository;
use crate::db::inquiries::{InquiryFilter, InquiryRow};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::services::OrderService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
    /// Refund the referenced order in full before answering. Only valid for
    /// refund inquiries.
    #[serde(default)]
    pub approve_refund: bool,
}

#[derive(Debug, Serialize)]
pub struct Answered {
    pub inquiry: InquiryRow,
    /// The refunded order, when a refund was approved.
    pub refunded_order: Option<Order>,
    /// Whether the member was notified by e-mail.
    pub emailed: bool,
}

/// GET /api/admin/inquiries
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(filter): Query<InquiryFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<InquiryRow>>> {
    let (items, total) = InquiryRepository::new(state.pool())
        .list(&filter, page)
        .await?;
    Ok(Json(Page::new(items, page, total)))
}

/// GET /api/admin/inquiries/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<InquiryId>,
) -> Result<Json<InquiryRow>> {
    let inquiry = InquiryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Inquiry not found".to_string()))?;
    Ok(Json(inquiry))
}

/// Answer an inquiry, optionally approving its refund.
///
/// POST /api/admin/inquiries/{id}/answer
///
/// The refund runs first; if the gateway refuses it, nothing is answered.
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, approve_refund = req.approve_refund))]
pub async fn answer(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<InquiryId>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<Answered>> {
    let text = req.answer.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Answer is required".to_string()));
    }

    let inquiries = InquiryRepository::new(state.pool());
    let inquiry = inquiries
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Inquiry not found".to_string()))?;
    if inquiry.inquiry.status == InquiryStatus::Closed {
        return Err(AppError::Conflict("Inquiry is closed".to_string()));
    }

    let refunded_order = if req.approve_refund {
        let order_id = refundable_order(&inquiry)?;
        let reason = format!("Refund approved for inquiry {}", inquiry.inquiry.id);
        Some(OrderService::new(&state).refund(order_id, &reason).await?)
    } else {
        None
    };

    inquiries.answer(id, text).await?;
    let inquiry = inquiries.get(id).await?.ok_or_else(|| {
        AppError::Internal(format!("inquiry {id} vanished after answering"))
    })?;
    info!(inquiry_id = %id, "Inquiry answered");

    let emailed = notify_member(&state, &inquiry, text).await;

    Ok(Json(Answered {
        inquiry,
        refunded_order,
        emailed,
    }))
}

/// POST /api/admin/inquiries/{id}/close
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn close(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<InquiryId>,
) -> Result<Json<InquiryRow>> {
    let inquiries = InquiryRepository::new(state.pool());
    inquiries.close(id).await?;
    let inquiry = inquiries
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Inquiry not found".to_string()))?;
    Ok(Json(inquiry))
}

/// The order a refund approval applies to.
fn refundable_order(inquiry: &InquiryRow) -> Result<OrderId> {
    if inquiry.inquiry.kind != InquiryKind::Refund {
        return Err(AppError::BadRequest(
            "Only refund inquiries can approve a refund".to_string(),
        ));
    }
    inquiry
        .inquiry
        .order_id
        .ok_or_else(|| AppError::Conflict("Refund inquiry has no order attached".to_string()))
}

/// Mail the answer when SMTP is configured. Failures are logged only.
async fn notify_member(state: &AppState, inquiry: &InquiryRow, answer: &str) -> bool {
    let Some(email) = state.email() else {
        return false;
    };

    match email
        .send_inquiry_answer(
            &inquiry.member_email,
            &inquiry.member_name,
            &inquiry.inquiry.title,
            answer,
        )
        .await
    {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, inquiry_id = %inquiry.inquiry.id, "Failed to send answer e-mail");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use purewell_core::models::Inquiry;
    use purewell_core::MemberId;

    use super::*;

    fn row(kind: InquiryKind, order_id: Option<OrderId>) -> InquiryRow {
        InquiryRow {
            inquiry: Inquiry {
                id: InquiryId::new(3),
                member_id: MemberId::new(9),
                order_id,
                kind,
                title: kind.with_prefix("Filter leaks"),
                body: "Water under the sink".to_string(),
                status: InquiryStatus::Open,
                answer: None,
                answered_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            member_name: "Kim".to_string(),
            member_email: "kim@example.com".to_string(),
            order_number: None,
        }
    }

    #[test]
    fn test_refund_needs_refund_kind_and_order() {
        let order = OrderId::new(77);
        assert!(matches!(
            refundable_order(&row(InquiryKind::Refund, Some(order))),
            Ok(id) if id == order
        ));
        assert!(matches!(
            refundable_order(&row(InquiryKind::Exchange, Some(order))),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            refundable_order(&row(InquiryKind::Refund, None)),
            Err(AppError::Conflict(_))
        ));
    }
}
