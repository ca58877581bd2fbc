//! Support tickets.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{InquiryId, InquiryKind, InquiryStatus, MemberId, OrderId};

/// A general inquiry or a refund/exchange request.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Inquiry {
    pub id: InquiryId,
    pub member_id: MemberId,
    pub order_id: Option<OrderId>,
    pub kind: InquiryKind,
    /// Carries the kind prefix for refund and exchange requests.
    pub title: String,
    pub body: String,
    pub status: InquiryStatus,
    pub answer: Option<String>,
    pub answered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
