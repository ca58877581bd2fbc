//! Category maintenance.

use purewell_core::CategoryId;
use purewell_core::models::Category;
use sqlx::PgPool;

use super::{RepositoryError, conflict_on_constraint};

/// Repository for category maintenance.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every category; callers build the tree.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, parent_id, name, sort_order FROM shop.category ORDER BY sort_order, name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Get a category by ID.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, parent_id, name, sort_order FROM shop.category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(category)
    }

    /// Insert a category. The caller checks that `parent_id` names a main
    /// category.
    pub async fn create(
        &self,
        parent_id: Option<CategoryId>,
        name: &str,
        sort_order: i32,
    ) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO shop.category (parent_id, name, sort_order) VALUES ($1, $2, $3) \
             RETURNING id, parent_id, name, sort_order",
        )
        .bind(parent_id)
        .bind(name)
        .bind(sort_order)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_constraint(e, "a category with this name already exists here"))?;
        Ok(category)
    }

    /// Rename or reorder a category.
    pub async fn update(
        &self,
        id: CategoryId,
        name: &str,
        sort_order: i32,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            "UPDATE shop.category SET name = $2, sort_order = $3 WHERE id = $1 \
             RETURNING id, parent_id, name, sort_order",
        )
        .bind(id)
        .bind(name)
        .bind(sort_order)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_constraint(e, "a category with this name already exists here"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a category that nothing references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` while products or sub categories
    /// still point at it.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let (children, products) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT (SELECT COUNT(*) FROM shop.category WHERE parent_id = $1), \
                    (SELECT COUNT(*) FROM shop.product WHERE category_id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        if children > 0 {
            return Err(RepositoryError::Conflict(format!(
                "category has {children} sub categories"
            )));
        }
        if products > 0 {
            return Err(RepositoryError::Conflict(format!(
                "category has {products} products"
            )));
        }

        let result = sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| conflict_on_constraint(e, "category is still referenced"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
