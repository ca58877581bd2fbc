//! Orders, payment completion and cancellation.
//!
//! Everything that moves stock, coupons or points happens inside a single
//! transaction with the order row locked, so a webhook and the browser
//! completing the same payment cannot both apply it. Reversals use the
//! shared [`Reversal`] so the storefront and back office undo orders alike.

use chrono::{DateTime, Utc};
use purewell_core::models::{Order, OrderItem};
use purewell_core::reversal::Reversal;
use purewell_core::{
    CheckoutQuote, MemberCouponId, MemberId, OrderId, OrderStatus, PageRequest, ProductId,
};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};

use super::{RepositoryError, conflict_on_unique};

const ORDER_COLUMNS: &str = "id, order_number, member_id, status, recipient_name, \
     recipient_phone, postal_code, address_line1, address_line2, delivery_memo, subtotal, \
     coupon_discount, points_used, shipping_fee, total, earned_points, member_coupon_id, \
     payment_id, pay_method, paid_at, tracking_number, cancelled_at, created_at, updated_at";

/// Ledger reasons written by order flows.
pub mod reason {
    pub const POINTS_SPENT: &str = "order_payment";
    pub const POINTS_EARNED: &str = "order_reward";
}

/// Delivery details captured at checkout.
#[derive(Debug, Clone)]
pub struct Shipping<'a> {
    pub recipient_name: &'a str,
    pub recipient_phone: &'a str,
    pub postal_code: &'a str,
    pub address_line1: &'a str,
    pub address_line2: &'a str,
    pub delivery_memo: Option<&'a str>,
}

/// A line to snapshot onto the order.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Payment facts confirmed with the gateway.
#[derive(Debug, Clone, Copy)]
pub struct PaymentRecord<'a> {
    pub payment_id: &'a str,
    pub pay_method: Option<&'a str>,
    pub paid_at: DateTime<Utc>,
}

/// Result of applying a confirmed payment.
#[derive(Debug)]
pub enum Completion {
    /// Stock, coupon and points were applied and the order is paid.
    Completed(Order),
    /// The order was already paid by an earlier call.
    AlreadyPaid(Order),
    /// The order is in a state that cannot accept a payment.
    NotPending(OrderStatus),
    /// A product ran out. Nothing was applied.
    OutOfStock(ProductId),
    /// The coupon was used elsewhere. Nothing was applied.
    CouponUnavailable,
    /// The balance no longer covers the points. Nothing was applied.
    PointsUnavailable,
}

/// An order placed by one of a headquarters' branches.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BranchOrder {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub branch_name: String,
}

/// Repository for order operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a `pending_payment` order with its items.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        order_number: &str,
        member_id: MemberId,
        shipping: &Shipping<'_>,
        quote: &CheckoutQuote,
        member_coupon_id: Option<MemberCouponId>,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO shop.order (order_number, member_id, recipient_name, recipient_phone, \
             postal_code, address_line1, address_line2, delivery_memo, subtotal, \
             coupon_discount, points_used, shipping_fee, total, earned_points, member_coupon_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_number)
        .bind(member_id)
        .bind(shipping.recipient_name)
        .bind(shipping.recipient_phone)
        .bind(shipping.postal_code)
        .bind(shipping.address_line1)
        .bind(shipping.address_line2)
        .bind(shipping.delivery_memo)
        .bind(quote.subtotal)
        .bind(quote.coupon_discount)
        .bind(quote.points_used)
        .bind(quote.shipping_fee)
        .bind(quote.total)
        .bind(quote.earned_points)
        .bind(member_coupon_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "order number already exists"))?;

        for item in items {
            sqlx::query(
                "INSERT INTO shop.order_item (order_id, product_id, product_name, unit_price, quantity) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.unit_price)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order)
    }

    /// Find an order by number, regardless of owner.
    pub async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE order_number = $1"
        ))
        .bind(order_number)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Find an order the viewer may see: their own, or one placed by a
    /// branch of theirs.
    pub async fn find_visible_to(
        &self,
        order_number: &str,
        viewer: MemberId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE order_number = $1 \
             AND (member_id = $2 \
                  OR member_id IN (SELECT id FROM shop.member WHERE headquarters_id = $2))"
        ))
        .bind(order_number)
        .bind(viewer)
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

    /// A member's orders, newest first.
    pub async fn list_for_member(
        &self,
        member_id: MemberId,
        page: PageRequest,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE member_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(member_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM shop.order WHERE member_id = $1",
        )
        .bind(member_id)
        .fetch_one(self.pool)
        .await?;

        Ok((orders, total))
    }

    /// Orders of every branch under a headquarters, newest first.
    pub async fn list_for_headquarters(
        &self,
        headquarters_id: MemberId,
        page: PageRequest,
    ) -> Result<(Vec<BranchOrder>, i64), RepositoryError> {
        let columns = ORDER_COLUMNS
            .split(", ")
            .map(|c| format!("o.{c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let orders = sqlx::query_as::<_, BranchOrder>(&format!(
            "SELECT {columns}, m.name AS branch_name \
             FROM shop.order o JOIN shop.member m ON m.id = o.member_id \
             WHERE m.headquarters_id = $1 \
             ORDER BY o.created_at DESC, o.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(headquarters_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM shop.order o JOIN shop.member m ON m.id = o.member_id \
             WHERE m.headquarters_id = $1",
        )
        .bind(headquarters_id)
        .fetch_one(self.pool)
        .await?;

        Ok((orders, total))
    }

    /// Orders that are placed but not yet delivered or closed.
    pub async fn count_in_progress(&self, member_id: MemberId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM shop.order WHERE member_id = $1 \
             AND status IN ('pending_payment', 'paid', 'preparing', 'shipping')",
        )
        .bind(member_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Apply a confirmed payment to a pending order.
    ///
    /// Stock is decremented (a product reaching zero becomes sold out), the
    /// coupon is marked used, points are deducted and awarded, purchased
    /// lines leave the cart and the order becomes `paid`. Any failure other
    /// than a database error rolls everything back and is reported as a
    /// [`Completion`] variant.
    pub async fn complete_payment(
        &self,
        order_id: OrderId,
        payment: PaymentRecord<'_>,
    ) -> Result<Completion, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = lock_order(&mut tx, order_id).await?;
        match order.status {
            OrderStatus::PendingPayment => {}
            OrderStatus::Paid if order.payment_id.as_deref() == Some(payment.payment_id) => {
                return Ok(Completion::AlreadyPaid(order));
            }
            status => return Ok(Completion::NotPending(status)),
        }

        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, product_name, unit_price, quantity \
             FROM shop.order_item WHERE order_id = $1 ORDER BY product_id",
        )
        .bind(order.id)
        .fetch_all(&mut *tx)
        .await?;

        for item in &items {
            let updated = sqlx::query(
                "UPDATE shop.product \
                 SET stock = stock - $2, \
                     status = CASE WHEN stock - $2 = 0 THEN 'sold_out'::shop.product_status \
                                   ELSE status END, \
                     updated_at = now() \
                 WHERE id = $1 AND status = 'on_sale' AND stock >= $2",
            )
            .bind(item.product_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Ok(Completion::OutOfStock(item.product_id));
            }
        }

        if let Some(member_coupon_id) = order.member_coupon_id {
            let updated = sqlx::query(
                "UPDATE shop.member_coupon SET used_at = now(), order_id = $2 \
                 WHERE id = $1 AND member_id = $3 AND used_at IS NULL",
            )
            .bind(member_coupon_id)
            .bind(order.id)
            .bind(order.member_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Ok(Completion::CouponUnavailable);
            }
        }

        if order.points_used > Decimal::ZERO {
            let updated = sqlx::query(
                "UPDATE shop.member SET points = points - $2 WHERE id = $1 AND points >= $2",
            )
            .bind(order.member_id)
            .bind(order.points_used)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Ok(Completion::PointsUnavailable);
            }
            record_points(&mut tx, order.member_id, -order.points_used, reason::POINTS_SPENT, order.id)
                .await?;
        }

        if order.earned_points > Decimal::ZERO {
            sqlx::query("UPDATE shop.member SET points = points + $2 WHERE id = $1")
                .bind(order.member_id)
                .bind(order.earned_points)
                .execute(&mut *tx)
                .await?;
            record_points(&mut tx, order.member_id, order.earned_points, reason::POINTS_EARNED, order.id)
                .await?;
        }

        sqlx::query(
            "DELETE FROM shop.cart_item WHERE member_id = $1 \
             AND product_id IN (SELECT product_id FROM shop.order_item WHERE order_id = $2)",
        )
        .bind(order.member_id)
        .bind(order.id)
        .execute(&mut *tx)
        .await?;

        let paid = sqlx::query_as::<_, Order>(&format!(
            "UPDATE shop.order SET status = 'paid', payment_id = $2, pay_method = $3, \
             paid_at = $4, updated_at = now() WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.id)
        .bind(payment.payment_id)
        .bind(payment.pay_method)
        .bind(payment.paid_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "payment already applied to another order"))?;

        tx.commit().await?;
        Ok(Completion::Completed(paid))
    }

    /// Cancel an order that was never paid. Nothing was applied yet, so
    /// only the status changes.
    pub async fn cancel_pending(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE shop.order SET status = 'cancelled', cancelled_at = now(), updated_at = now() \
             WHERE id = $1 AND status = 'pending_payment' RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Lock an order for reversal. The lock holds until the returned
    /// [`Reversal`] finishes or is dropped.
    pub async fn begin_reversal(&self, order_id: OrderId) -> Result<Reversal, RepositoryError> {
        Reversal::begin(self.pool, order_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}

async fn lock_order(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<Order, RepositoryError> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM shop.order WHERE id = $1 FOR UPDATE"
    ))
    .bind(order_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(RepositoryError::NotFound)
}

async fn record_points(
    tx: &mut Transaction<'_, Postgres>,
    member_id: MemberId,
    delta: Decimal,
    reason: &str,
    order_id: OrderId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO shop.point_transaction (member_id, delta, reason, order_id) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(member_id)
    .bind(delta)
    .bind(reason)
    .bind(order_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
