//! Catalog queries for the storefront.
//!
//! Hidden products never leave this module: every product query filters on
//! `status <> 'hidden'`.

use purewell_core::models::{Category, Product};
use purewell_core::{CategoryId, PageRequest, ProductId};
use sqlx::PgPool;

use super::RepositoryError;

const PRODUCT_COLUMNS: &str = "id, category_id, name, model_code, summary, description, \
     customer_price, business_price, stock, status, image_url, replacement_cycle_months, \
     created_at, updated_at";

/// Filters for the product listing.
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    /// Category ids to include. A main category should already be expanded
    /// to itself plus its subcategories.
    pub category_ids: Option<Vec<CategoryId>>,
    /// Case-insensitive match on name or model code.
    pub query: Option<String>,
}

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, unsorted.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, parent_id, name, sort_order FROM shop.category",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Visible products matching `filter`, newest first.
    pub async fn list_visible(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let category_ids: Option<Vec<i32>> = filter
            .category_ids
            .as_ref()
            .map(|ids| ids.iter().map(|id| id.as_i32()).collect());
        let pattern = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", escape_like(q)));

        let conditions = "status <> 'hidden' \
             AND ($1::int[] IS NULL OR category_id = ANY($1)) \
             AND ($2::text IS NULL OR name ILIKE $2 OR model_code ILIKE $2)";

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE {conditions} \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(&category_ids)
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM shop.product WHERE {conditions}"
        ))
        .bind(&category_ids)
        .bind(&pattern)
        .fetch_one(self.pool)
        .await?;

        Ok((products, total))
    }

    /// A visible product.
    pub async fn get_visible(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1 AND status <> 'hidden'"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Products by id, hidden ones included, in no particular order.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }
}

/// Escape `LIKE` wildcards in user input.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("RO-500"), "RO-500");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }
}
