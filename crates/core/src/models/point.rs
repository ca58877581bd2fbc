//! Point ledger entries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{MemberId, OrderId, PointTransactionId};

/// One change to a member's point balance. The balance on the member row
/// is the sum of all deltas.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct PointTransaction {
    pub id: PointTransactionId,
    pub member_id: MemberId,
    /// Positive when earned or granted, negative when spent or revoked.
    pub delta: Decimal,
    pub reason: String,
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
}
