//! Product maintenance and stock.

use purewell_core::models::Product;
use purewell_core::{CategoryId, PageRequest, ProductId, ProductStatus};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use super::{RepositoryError, conflict_on_constraint, like_pattern};

const PRODUCT_COLUMNS: &str = "id, category_id, name, model_code, summary, description, \
     customer_price, business_price, stock, status, image_url, replacement_cycle_months, \
     created_at, updated_at";

/// Product list filters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatus>,
    /// Matches name or model code.
    pub q: Option<String>,
}

/// Editable product fields, used for both create and full update.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub category_id: CategoryId,
    pub name: String,
    pub model_code: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub customer_price: Decimal,
    pub business_price: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub status: ProductStatus,
    pub image_url: Option<String>,
    pub replacement_cycle_months: Option<i32>,
}

/// What `delete` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The product appears on orders, so it was hidden instead.
    Hidden,
    /// The row is gone.
    Deleted,
}

/// Repository for product maintenance.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Products of every status matching the filter, newest first. A main
    /// category includes its sub categories.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let pattern = filter.q.as_deref().filter(|q| !q.trim().is_empty()).map(like_pattern);
        let condition = "($1::int IS NULL OR category_id = $1 \
                  OR category_id IN (SELECT id FROM shop.category WHERE parent_id = $1)) \
             AND ($2::shop.product_status IS NULL OR status = $2) \
             AND ($3::text IS NULL OR name ILIKE $3 OR model_code ILIKE $3)";

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE {condition} \
             ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        ))
        .bind(filter.category_id)
        .bind(filter.status)
        .bind(pattern.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM shop.product WHERE {condition}"
        ))
        .bind(filter.category_id)
        .bind(filter.status)
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok((products, total))
    }

    /// Get a product by ID, whatever its status.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a duplicate model code or an
    /// unknown category.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO shop.product (category_id, name, model_code, summary, description, \
             customer_price, business_price, stock, status, image_url, replacement_cycle_months) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.model_code)
        .bind(&input.summary)
        .bind(&input.description)
        .bind(input.customer_price)
        .bind(input.business_price)
        .bind(input.stock)
        .bind(input.status)
        .bind(input.image_url.as_deref())
        .bind(input.replacement_cycle_months)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_constraint(e, "model code already exists or category is unknown"))?;
        Ok(product)
    }

    /// Replace every editable field.
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE shop.product SET category_id = $2, name = $3, model_code = $4, summary = $5, \
             description = $6, customer_price = $7, business_price = $8, stock = $9, status = $10, \
             image_url = $11, replacement_cycle_months = $12, updated_at = now() \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.model_code)
        .bind(&input.summary)
        .bind(&input.description)
        .bind(input.customer_price)
        .bind(input.business_price)
        .bind(input.stock)
        .bind(input.status)
        .bind(input.image_url.as_deref())
        .bind(input.replacement_cycle_months)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_constraint(e, "model code already exists or category is unknown"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Remove a product. Products that were ever ordered are hidden so order
    /// history keeps its reference.
    pub async fn delete(&self, id: ProductId) -> Result<Removal, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let ordered = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM shop.order_item WHERE product_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let affected = if ordered {
            sqlx::query(
                "UPDATE shop.product SET status = 'hidden', updated_at = now() WHERE id = $1",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        } else {
            sqlx::query("DELETE FROM shop.product WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
        };

        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await?;
        Ok(if ordered { Removal::Hidden } else { Removal::Deleted })
    }

    /// Add `delta` to stock. Reaching zero marks an on-sale product sold
    /// out; restocking a sold-out product puts it back on sale. Hidden
    /// products stay hidden.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if stock would go negative.
    pub async fn adjust_stock(&self, id: ProductId, delta: i32) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE shop.product SET stock = stock + $2, \
                 status = CASE \
                     WHEN status = 'on_sale' AND stock + $2 = 0 THEN 'sold_out'::shop.product_status \
                     WHEN status = 'sold_out' AND stock + $2 > 0 THEN 'on_sale'::shop.product_status \
                     ELSE status END, \
                 updated_at = now() \
             WHERE id = $1 AND stock + $2 >= 0 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(delta)
        .fetch_optional(self.pool)
        .await?;

        match product {
            Some(product) => Ok(product),
            None if self.get(id).await?.is_some() => Err(RepositoryError::Conflict(
                "stock cannot go below zero".to_string(),
            )),
            None => Err(RepositoryError::NotFound),
        }
    }

    /// Purchasable or sold-out products at or below `threshold`, lowest first.
    pub async fn low_stock(&self, threshold: i32, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product \
             WHERE status <> 'hidden' AND stock <= $1 ORDER BY stock, name LIMIT $2"
        ))
        .bind(threshold)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }
}
