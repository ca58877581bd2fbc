//! Putting back what a paid order took: stock, the coupon and points.
//!
//! Customer cancellation in the storefront and back-office reversals both go
//! through [`Reversal`]. The order row stays locked from [`Reversal::begin`]
//! until [`Reversal::finish`] commits, so the gateway refund can run while
//! nobody else moves the order. Dropping a `Reversal` rolls back and
//! releases the lock.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::{Order, OrderItem};
use crate::types::{OrderId, OrderStatus};

const ORDER_COLUMNS: &str = "id, order_number, member_id, status, recipient_name, \
     recipient_phone, postal_code, address_line1, address_line2, delivery_memo, subtotal, \
     coupon_discount, points_used, shipping_fee, total, earned_points, member_coupon_id, \
     payment_id, pay_method, paid_at, tracking_number, cancelled_at, created_at, updated_at";

/// Point ledger reasons written by reversals.
pub mod reason {
    pub const POINTS_RESTORED: &str = "order_cancel_refund";
    pub const POINTS_REVOKED: &str = "order_cancel_revoke";
}

/// A paid order locked for reversal.
pub struct Reversal {
    tx: Transaction<'static, Postgres>,
    order: Order,
}

impl Reversal {
    /// Open a transaction and lock the order row.
    ///
    /// Returns `None` when the order does not exist.
    ///
    /// # Errors
    ///
    /// Returns the database error if the transaction or lock fails.
    pub async fn begin(pool: &PgPool, id: OrderId) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(order.map(|order| Self { tx, order }))
    }

    /// The order as it stood when the lock was taken.
    #[must_use]
    pub const fn order(&self) -> &Order {
        &self.order
    }

    /// Restock unshipped goods, release the coupon, return spent points,
    /// take back earned points down to a zero balance, move the order to
    /// `target` and commit.
    ///
    /// # Errors
    ///
    /// Returns the database error; nothing is applied in that case.
    pub async fn finish(mut self, target: OrderStatus) -> Result<Order, sqlx::Error> {
        let order = &self.order;

        if order.status.restocks_on_reversal() {
            let items = sqlx::query_as::<_, OrderItem>(
                "SELECT id, order_id, product_id, product_name, unit_price, quantity \
                 FROM shop.order_item WHERE order_id = $1 ORDER BY product_id",
            )
            .bind(order.id)
            .fetch_all(&mut *self.tx)
            .await?;

            for item in &items {
                sqlx::query(
                    "UPDATE shop.product \
                     SET stock = stock + $2, \
                         status = CASE WHEN status = 'sold_out' THEN 'on_sale'::shop.product_status \
                                       ELSE status END, \
                         updated_at = now() \
                     WHERE id = $1",
                )
                .bind(item.product_id)
                .bind(item.quantity)
                .execute(&mut *self.tx)
                .await?;
            }
        }

        if let Some(member_coupon_id) = order.member_coupon_id {
            sqlx::query("UPDATE shop.member_coupon SET used_at = NULL, order_id = NULL WHERE id = $1")
                .bind(member_coupon_id)
                .execute(&mut *self.tx)
                .await?;
        }

        if order.points_used > Decimal::ZERO {
            sqlx::query("UPDATE shop.member SET points = points + $2 WHERE id = $1")
                .bind(order.member_id)
                .bind(order.points_used)
                .execute(&mut *self.tx)
                .await?;
            record_points(&mut self.tx, order, order.points_used, reason::POINTS_RESTORED).await?;
        }

        if order.earned_points > Decimal::ZERO {
            let balance = sqlx::query_scalar::<_, Decimal>(
                "SELECT points FROM shop.member WHERE id = $1 FOR UPDATE",
            )
            .bind(order.member_id)
            .fetch_one(&mut *self.tx)
            .await?;
            let revoked = revocable_points(order.earned_points, balance);

            if revoked > Decimal::ZERO {
                sqlx::query("UPDATE shop.member SET points = points - $2 WHERE id = $1")
                    .bind(order.member_id)
                    .bind(revoked)
                    .execute(&mut *self.tx)
                    .await?;
                record_points(&mut self.tx, order, -revoked, reason::POINTS_REVOKED).await?;
            }
        }

        let reversed = sqlx::query_as::<_, Order>(&format!(
            "UPDATE shop.order SET status = $2, cancelled_at = now(), updated_at = now() \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.id)
        .bind(target)
        .fetch_one(&mut *self.tx)
        .await?;

        self.tx.commit().await?;
        Ok(reversed)
    }
}

/// Earned points may already be spent; the balance stops at zero.
fn revocable_points(earned: Decimal, balance: Decimal) -> Decimal {
    earned.min(balance).max(Decimal::ZERO)
}

async fn record_points(
    tx: &mut Transaction<'static, Postgres>,
    order: &Order,
    delta: Decimal,
    reason: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO shop.point_transaction (member_id, delta, reason, order_id) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(order.member_id)
    .bind(delta)
    .bind(reason)
    .bind(order.id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn won(amount: i64) -> Decimal {
        Decimal::from(amount)
    }

    #[test]
    fn test_revocable_points_stop_at_balance() {
        assert_eq!(revocable_points(won(500), won(2_000)), won(500));
        assert_eq!(revocable_points(won(500), won(120)), won(120));
        assert_eq!(revocable_points(won(500), Decimal::ZERO), Decimal::ZERO);
    }
}
