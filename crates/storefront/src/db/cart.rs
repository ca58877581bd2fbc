//! Persistent carts for signed-in members.

use purewell_core::models::{CartItem, MAX_LINE_QUANTITY};
use purewell_core::{MemberId, ProductId};
use sqlx::PgPool;

use super::RepositoryError;

/// Repository for `shop.cart_item`.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Lines in the member's cart, oldest first.
    pub async fn list(&self, member_id: MemberId) -> Result<Vec<CartItem>, RepositoryError> {
        let items = sqlx::query_as::<_, CartItem>(
            "SELECT id, member_id, product_id, quantity, created_at \
             FROM shop.cart_item WHERE member_id = $1 ORDER BY created_at, id",
        )
        .bind(member_id)
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }

    /// Add `quantity` of a product. An existing line is increased, capped at
    /// the per-line maximum.
    pub async fn add(
        &self,
        member_id: MemberId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO shop.cart_item (member_id, product_id, quantity) \
             VALUES ($1, $2, LEAST($3, $4)) \
             ON CONFLICT (member_id, product_id) DO UPDATE \
             SET quantity = LEAST(shop.cart_item.quantity + EXCLUDED.quantity, $4)",
        )
        .bind(member_id)
        .bind(product_id)
        .bind(quantity)
        .bind(MAX_LINE_QUANTITY)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Replace the quantity of an existing line.
    pub async fn set_quantity(
        &self,
        member_id: MemberId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.cart_item SET quantity = $3 WHERE member_id = $1 AND product_id = $2",
        )
        .bind(member_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove a line. Removing a missing line is not an error.
    pub async fn remove(&self, member_id: MemberId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shop.cart_item WHERE member_id = $1 AND product_id = $2")
            .bind(member_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Empty the cart.
    pub async fn clear(&self, member_id: MemberId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shop.cart_item WHERE member_id = $1")
            .bind(member_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Fold guest-cart lines into the member's cart after sign-in.
    pub async fn merge(
        &self,
        member_id: MemberId,
        lines: &[(ProductId, i32)],
    ) -> Result<(), RepositoryError> {
        if lines.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for (product_id, quantity) in lines {
            // Products deleted since the guest added them are skipped.
            sqlx::query(
                "INSERT INTO shop.cart_item (member_id, product_id, quantity) \
                 SELECT $1, p.id, LEAST($3, $4) FROM shop.product p \
                 WHERE p.id = $2 AND p.status <> 'hidden' \
                 ON CONFLICT (member_id, product_id) DO UPDATE \
                 SET quantity = LEAST(shop.cart_item.quantity + EXCLUDED.quantity, $4)",
            )
            .bind(member_id)
            .bind(product_id)
            .bind(quantity)
            .bind(MAX_LINE_QUANTITY)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
