//! Persisted cart lines for signed-in members.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{CartItemId, MemberId, ProductId};

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 99;

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: CartItemId,
    pub member_id: MemberId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}
