//! Catalog reads with per-viewer prices.
//!
//! The category tree changes rarely and is read on every catalog page, so it
//! is cached with `moka` (5-minute TTL). Product rows are not cached because
//! stock moves with every payment.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, instrument};

use purewell_core::models::{CategoryTree, Product};
use purewell_core::{CategoryId, MemberType, Page, PageRequest, PriceView, ProductId, ProductStatus};

use crate::db::products::ProductFilter;
use crate::db::{ProductRepository, RepositoryError};

const TREE_KEY: &str = "categories";

/// Category tree cache.
#[derive(Clone)]
pub struct Catalog {
    cache: Cache<&'static str, Arc<CategoryTree>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl Catalog {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// The category tree, loaded on first use and after expiry.
    #[instrument(skip_all)]
    pub async fn category_tree(&self, pool: &PgPool) -> Result<Arc<CategoryTree>, RepositoryError> {
        if let Some(tree) = self.cache.get(TREE_KEY).await {
            debug!("Cache hit for category tree");
            return Ok(tree);
        }

        let categories = ProductRepository::new(pool).list_categories().await?;
        let tree = Arc::new(CategoryTree::build(categories));
        self.cache.insert(TREE_KEY, Arc::clone(&tree)).await;
        Ok(tree)
    }

    /// Visible products with prices resolved for `viewer`.
    ///
    /// A main category matches its subcategories too. An unknown category
    /// yields an empty page.
    #[instrument(skip(self, pool))]
    pub async fn list_products(
        &self,
        pool: &PgPool,
        viewer: Option<MemberType>,
        category_id: Option<CategoryId>,
        query: Option<String>,
        page: PageRequest,
    ) -> Result<Page<ProductSummary>, RepositoryError> {
        let category_ids = match category_id {
            Some(id) => {
                let ids = self.category_tree(pool).await?.with_descendants(id);
                if ids.is_empty() {
                    return Ok(Page::new(Vec::new(), page, 0));
                }
                Some(ids)
            }
            None => None,
        };

        let filter = ProductFilter {
            category_ids,
            query,
        };
        let (products, total) = ProductRepository::new(pool)
            .list_visible(&filter, page)
            .await?;

        Ok(Page::new(products, page, total).map(|p| ProductSummary::new(&p, viewer)))
    }

    /// A visible product with prices resolved for `viewer`.
    #[instrument(skip(self, pool))]
    pub async fn product_detail(
        &self,
        pool: &PgPool,
        viewer: Option<MemberType>,
        id: ProductId,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let Some(product) = ProductRepository::new(pool).get_visible(id).await? else {
            return Ok(None);
        };

        let tree = self.category_tree(pool).await?;
        let category_path = category_path(&tree, product.category_id);

        Ok(Some(ProductDetail {
            summary: ProductSummary::new(&product, viewer),
            description: product.description,
            replacement_cycle_months: product.replacement_cycle_months,
            category_path,
        }))
    }
}

/// Main then sub category names.
fn category_path(tree: &CategoryTree, id: CategoryId) -> Vec<String> {
    let mut path = Vec::new();
    let mut current = tree.find(id);
    while let Some(category) = current {
        path.push(category.name.clone());
        current = category.parent_id.and_then(|parent| tree.find(parent));
    }
    path.reverse();
    path
}

/// A product as listed to one viewer.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub model_code: String,
    pub summary: String,
    pub image_url: Option<String>,
    pub status: ProductStatus,
    /// On sale with stock left.
    pub available: bool,
    pub price: PriceView,
    /// Only filled in for admins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
}

impl ProductSummary {
    #[must_use]
    pub fn new(product: &Product, viewer: Option<MemberType>) -> Self {
        Self {
            id: product.id,
            category_id: product.category_id,
            name: product.name.clone(),
            model_code: product.model_code.clone(),
            summary: product.summary.clone(),
            image_url: product.image_url.clone(),
            status: product.status,
            available: product.can_fulfil(1),
            price: product.price_for(viewer),
            stock: matches!(viewer, Some(MemberType::Admin)).then_some(product.stock),
        }
    }
}

/// Product detail page data.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub summary: ProductSummary,
    pub description: String,
    pub replacement_cycle_months: Option<i32>,
    pub category_path: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use purewell_core::models::Category;
    use rust_decimal::Decimal;

    use super::*;

    fn product(stock: i32, status: ProductStatus) -> Product {
        Product {
            id: ProductId::new(1),
            category_id: CategoryId::new(3),
            name: "RO Membrane 75G".to_string(),
            model_code: "RO-75".to_string(),
            summary: String::new(),
            description: String::new(),
            customer_price: Decimal::from(45_000),
            business_price: Decimal::from(36_000),
            stock,
            status,
            image_url: None,
            replacement_cycle_months: Some(24),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_prices_per_viewer() {
        let p = product(10, ProductStatus::OnSale);

        let guest = ProductSummary::new(&p, None);
        assert_eq!(guest.price.charged(), Decimal::from(45_000));
        assert_eq!(guest.stock, None);

        let branch = ProductSummary::new(&p, Some(MemberType::Branch));
        assert_eq!(branch.price.charged(), Decimal::from(36_000));

        let admin = ProductSummary::new(&p, Some(MemberType::Admin));
        assert_eq!(admin.stock, Some(10));
    }

    #[test]
    fn test_summary_availability() {
        assert!(ProductSummary::new(&product(1, ProductStatus::OnSale), None).available);
        assert!(!ProductSummary::new(&product(0, ProductStatus::OnSale), None).available);
        assert!(!ProductSummary::new(&product(5, ProductStatus::SoldOut), None).available);
    }

    #[test]
    fn test_business_view_serializes_list_price() {
        let p = product(10, ProductStatus::OnSale);
        let json = serde_json::to_value(ProductSummary::new(&p, Some(MemberType::Headquarters)))
            .unwrap();
        assert_eq!(json["price"]["view"], "business");
        assert_eq!(json["price"]["list_price"], "45000");
    }

    #[test]
    fn test_category_path() {
        let tree = CategoryTree::build(vec![
            Category {
                id: CategoryId::new(1),
                parent_id: None,
                name: "Filters".to_string(),
                sort_order: 0,
            },
            Category {
                id: CategoryId::new(3),
                parent_id: Some(CategoryId::new(1)),
                name: "Membranes".to_string(),
                sort_order: 0,
            },
        ]);
        assert_eq!(
            category_path(&tree, CategoryId::new(3)),
            vec!["Filters".to_string(), "Membranes".to_string()]
        );
        assert!(category_path(&tree, CategoryId::new(99)).is_empty());
    }
}
