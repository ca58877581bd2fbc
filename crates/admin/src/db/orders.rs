//! Order administration: search, fulfilment status and reversals.
//!
//! Reversals go through the shared [`Reversal`], which keeps the order row
//! locked while the gateway refund runs.

use chrono::NaiveDate;
use purewell_core::models::{Order, OrderItem};
use purewell_core::reversal::Reversal;
use purewell_core::{MemberId, OrderId, OrderStatus, PageRequest};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{RepositoryError, like_pattern};

const ORDER_COLUMNS: &str = "id, order_number, member_id, status, recipient_name, \
     recipient_phone, postal_code, address_line1, address_line2, delivery_memo, subtotal, \
     coupon_discount, points_used, shipping_fee, total, earned_points, member_coupon_id, \
     payment_id, pay_method, paid_at, tracking_number, cancelled_at, created_at, updated_at";

/// Order list filters. Dates are calendar days in Korea time, inclusive.
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Matches order number, recipient, or the buyer's name or email.
    pub q: Option<String>,
}

/// An order with the buyer's name, for list views.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub member_name: String,
    pub member_email: String,
}

/// Repository for order administration.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders matching the filter, newest first.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<(Vec<OrderRow>, i64), RepositoryError> {
        let columns = prefixed_columns("o");
        let pattern = filter.q.as_deref().filter(|q| !q.trim().is_empty()).map(like_pattern);
        let condition = "($1::shop.order_status IS NULL OR o.status = $1) \
             AND ($2::date IS NULL OR o.created_at >= ($2::date::timestamp AT TIME ZONE 'Asia/Seoul')) \
             AND ($3::date IS NULL \
                  OR o.created_at < (($3::date + 1)::timestamp AT TIME ZONE 'Asia/Seoul')) \
             AND ($4::text IS NULL OR o.order_number ILIKE $4 OR o.recipient_name ILIKE $4 \
                  OR m.name ILIKE $4 OR m.email ILIKE $4)";

        let orders = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {columns}, m.name AS member_name, m.email AS member_email \
             FROM shop.order o JOIN shop.member m ON m.id = o.member_id \
             WHERE {condition} \
             ORDER BY o.created_at DESC, o.id DESC LIMIT $5 OFFSET $6"
        ))
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .bind(pattern.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM shop.order o JOIN shop.member m ON m.id = o.member_id \
             WHERE {condition}"
        ))
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok((orders, total))
    }

    /// Get an order by ID.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Get an order by its order number.
    pub async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE order_number = $1"
        ))
        .bind(order_number)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Items of an order in insertion order.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, product_name, unit_price, quantity \
             FROM shop.order_item WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }

    /// A member's most recent orders.
    pub async fn recent_for_member(
        &self,
        member_id: MemberId,
        limit: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE member_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(member_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Move an order from `from` to `to`, optionally recording a tracking
    /// number. The caller validates the transition.
    ///
    /// Returns `None` when the order is no longer in `from`.
    pub async fn set_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE shop.order SET status = $3, \
                 tracking_number = COALESCE($4, tracking_number), updated_at = now() \
             WHERE id = $1 AND status = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(tracking_number)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Cancel an order that was never paid.
    pub async fn cancel_pending(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE shop.order SET status = 'cancelled', cancelled_at = now(), updated_at = now() \
             WHERE id = $1 AND status = 'pending_payment' RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Lock an order for reversal. The lock holds until the returned
    /// [`Reversal`] finishes or is dropped.
    pub async fn begin_reversal(&self, id: OrderId) -> Result<Reversal, RepositoryError> {
        Reversal::begin(self.pool, id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}

fn prefixed_columns(alias: &str) -> String {
    ORDER_COLUMNS
        .split(", ")
        .map(|c| format!("{alias}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_columns() {
        let columns = prefixed_columns("o");
        assert!(columns.starts_with("o.id, o.order_number, "));
        assert!(columns.ends_with("o.updated_at"));
        assert!(!columns.contains(", id"));
    }
}
