//! Seed the catalog from a YAML file.
//!
//! The file lists main categories, each with optional sub categories, and
//! products under either level. Everything is validated before a connection
//! is opened; the upsert then runs in one transaction keyed on category
//! `(parent, name)` and product `model_code`.
//!
//! ```yaml
//! categories:
//!   - name: Filters
//!     sort_order: 1
//!     children:
//!       - name: Sediment
//!         products:
//!           - name: PW Sediment 10"
//!             model_code: PW-SD-10
//!             customer_price: 12000
//!             business_price: 9000
//!             stock: 120
//!             replacement_cycle_months: 3
//! ```
//!
//! With `--clear`, products missing from the file are deleted, or hidden when
//! an order still references them, and categories left empty are removed.

use std::collections::HashSet;
use std::path::Path;

use purewell_admin::db;
use purewell_core::{CategoryId, ProductStatus};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{Postgres, Transaction};
use tracing::{error, info};

/// Top level of a catalog file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    pub categories: Vec<MainCategorySeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MainCategorySeed {
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub children: Vec<SubCategorySeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// Sub categories cannot nest further.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubCategorySeed {
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
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

/// Counts reported after a seed run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub products_deleted: u64,
    pub products_hidden: u64,
    pub categories_deleted: u64,
}

/// Every problem in the file, so one run reports them all.
#[must_use]
pub fn validate_catalog(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut model_codes = HashSet::new();

    if catalog.categories.is_empty() {
        errors.push("catalog has no categories".to_string());
    }

    let mut main_names = HashSet::new();
    for main in &catalog.categories {
        let main_name = main.name.trim();
        if main_name.is_empty() {
            errors.push("category with an empty name".to_string());
        } else if !main_names.insert(main_name) {
            errors.push(format!("duplicate category '{main_name}'"));
        }
        validate_products(main_name, &main.products, &mut model_codes, &mut errors);

        let mut sub_names = HashSet::new();
        for sub in &main.children {
            let sub_name = sub.name.trim();
            if sub_name.is_empty() {
                errors.push(format!("{main_name}: sub category with an empty name"));
            } else if !sub_names.insert(sub_name) {
                errors.push(format!("{main_name}: duplicate sub category '{sub_name}'"));
            }
            let path = format!("{main_name} > {sub_name}");
            validate_products(&path, &sub.products, &mut model_codes, &mut errors);
        }
    }

    errors
}

fn validate_products<'a>(
    path: &str,
    products: &'a [ProductSeed],
    model_codes: &mut HashSet<&'a str>,
    errors: &mut Vec<String>,
) {
    for product in products {
        let code = product.model_code.trim();
        if product.name.trim().is_empty() || code.is_empty() {
            errors.push(format!("{path}: product needs a name and model_code"));
        }
        if !code.is_empty() && !model_codes.insert(code) {
            errors.push(format!("{path}: duplicate model_code '{code}'"));
        }
        for (field, price) in [
            ("customer_price", product.customer_price),
            ("business_price", product.business_price),
        ] {
            if price < Decimal::ZERO || price.fract() != Decimal::ZERO {
                errors.push(format!(
                    "{path} / {code}: {field} must be a non-negative whole amount"
                ));
            }
        }
        if product.stock < 0 {
            errors.push(format!("{path} / {code}: stock cannot be negative"));
        }
        if product.replacement_cycle_months.is_some_and(|m| m <= 0) {
            errors.push(format!(
                "{path} / {code}: replacement_cycle_months must be positive"
            ));
        }
    }
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, the
/// database URL is missing, or any statement fails (nothing is committed).
pub async fn catalog(file_path: &str, clear: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    info!(categories = catalog.categories.len(), "Catalog validated");

    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let mut tx = pool.begin().await?;
    let summary = apply(&mut tx, &catalog, clear).await?;
    tx.commit().await?;

    info!("Seeding complete!");
    info!("  Categories upserted: {}", summary.categories);
    info!("  Products upserted: {}", summary.products);
    if clear {
        info!("  Products deleted: {}", summary.products_deleted);
        info!("  Products hidden (referenced by orders): {}", summary.products_hidden);
        info!("  Empty categories deleted: {}", summary.categories_deleted);
    }

    Ok(())
}

async fn apply(
    tx: &mut Transaction<'_, Postgres>,
    catalog: &CatalogFile,
    clear: bool,
) -> Result<SeedSummary, sqlx::Error> {
    let mut summary = SeedSummary::default();
    let mut category_ids: Vec<i32> = Vec::new();
    let mut model_codes: Vec<String> = Vec::new();

    for main in &catalog.categories {
        let main_id = upsert_category(tx, None, &main.name, main.sort_order).await?;
        category_ids.push(main_id.as_i32());
        for product in &main.products {
            upsert_product(tx, main_id, product).await?;
            model_codes.push(product.model_code.trim().to_string());
        }

        for sub in &main.children {
            let sub_id = upsert_category(tx, Some(main_id), &sub.name, sub.sort_order).await?;
            category_ids.push(sub_id.as_i32());
            for product in &sub.products {
                upsert_product(tx, sub_id, product).await?;
                model_codes.push(product.model_code.trim().to_string());
            }
        }
    }
    summary.categories = category_ids.len();
    summary.products = model_codes.len();

    if clear {
        summary.products_deleted = sqlx::query(
            r"
            DELETE FROM shop.product p
             WHERE p.model_code <> ALL($1)
               AND NOT EXISTS (SELECT 1 FROM shop.order_item oi WHERE oi.product_id = p.id)
            ",
        )
        .bind(&model_codes)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        summary.products_hidden = sqlx::query(
            r"
            UPDATE shop.product SET status = 'hidden', updated_at = now()
             WHERE model_code <> ALL($1) AND status <> 'hidden'
            ",
        )
        .bind(&model_codes)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        // Subs first so their parents can become empty.
        for level in ["c.parent_id IS NOT NULL", "c.parent_id IS NULL"] {
            summary.categories_deleted += sqlx::query(&format!(
                r"
                DELETE FROM shop.category c
                 WHERE {level}
                   AND c.id <> ALL($1)
                   AND NOT EXISTS (SELECT 1 FROM shop.product p WHERE p.category_id = c.id)
                   AND NOT EXISTS (SELECT 1 FROM shop.category s WHERE s.parent_id = c.id)
                "
            ))
            .bind(&category_ids)
            .execute(&mut **tx)
            .await?
            .rows_affected();
        }
    }

    Ok(summary)
}

async fn upsert_category(
    tx: &mut Transaction<'_, Postgres>,
    parent_id: Option<CategoryId>,
    name: &str,
    sort_order: i32,
) -> Result<CategoryId, sqlx::Error> {
    sqlx::query_scalar(
        r"
        INSERT INTO shop.category (parent_id, name, sort_order)
        VALUES ($1, $2, $3)
        ON CONFLICT ((COALESCE(parent_id, 0)), name)
        DO UPDATE SET sort_order = EXCLUDED.sort_order
        RETURNING id
        ",
    )
    .bind(parent_id)
    .bind(name.trim())
    .bind(sort_order)
    .fetch_one(&mut **tx)
    .await
}

async fn upsert_product(
    tx: &mut Transaction<'_, Postgres>,
    category_id: CategoryId,
    product: &ProductSeed,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        INSERT INTO shop.product (
            category_id, name, model_code, summary, description, customer_price,
            business_price, stock, status, image_url, replacement_cycle_months
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (model_code) DO UPDATE SET
            category_id = EXCLUDED.category_id,
            name = EXCLUDED.name,
            summary = EXCLUDED.summary,
            description = EXCLUDED.description,
            customer_price = EXCLUDED.customer_price,
            business_price = EXCLUDED.business_price,
            stock = EXCLUDED.stock,
            status = EXCLUDED.status,
            image_url = EXCLUDED.image_url,
            replacement_cycle_months = EXCLUDED.replacement_cycle_months,
            updated_at = now()
        ",
    )
    .bind(category_id)
    .bind(product.name.trim())
    .bind(product.model_code.trim())
    .bind(product.summary.trim())
    .bind(&product.description)
    .bind(product.customer_price)
    .bind(product.business_price)
    .bind(product.stock)
    .bind(product.status)
    .bind(product.image_url.as_deref())
    .bind(product.replacement_cycle_months)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../data/catalog.example.yaml");

    fn parse(yaml: &str) -> CatalogFile {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_sample_catalog_is_valid() {
        let catalog = parse(SAMPLE);
        assert!(validate_catalog(&catalog).is_empty());
        assert!(catalog.categories.iter().any(|c| !c.children.is_empty()));
    }

    #[test]
    fn test_defaults_applied() {
        let catalog = parse(
            r"
categories:
  - name: Parts
    products:
      - name: O-ring
        model_code: PW-OR-01
        customer_price: 1500
        business_price: 1000
",
        );
        let product = catalog.categories.first().unwrap().products.first().unwrap();
        assert_eq!(product.stock, 0);
        assert_eq!(product.status, ProductStatus::OnSale);
        assert_eq!(product.customer_price, Decimal::from(1500));
    }

    #[test]
    fn test_third_level_rejected() {
        let result: Result<CatalogFile, _> = serde_yaml::from_str(
            r"
categories:
  - name: Filters
    children:
      - name: Sediment
        children:
          - name: Too deep
",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let catalog = parse(
            r"
categories:
  - name: Filters
    children:
      - name: Carbon
        products:
          - name: Block
            model_code: PW-CB-10
            customer_price: 18000.5
            business_price: -1
      - name: Carbon
        products:
          - name: Block again
            model_code: PW-CB-10
            customer_price: 18000
            business_price: 14000
            stock: -3
            replacement_cycle_months: 0
",
        );
        let errors = validate_catalog(&catalog);
        assert_eq!(errors.len(), 6, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("duplicate sub category")));
        assert!(errors.iter().any(|e| e.contains("duplicate model_code 'PW-CB-10'")));
        assert!(errors.iter().any(|e| e.contains("customer_price")));
        assert!(errors.iter().any(|e| e.contains("business_price")));
        assert!(errors.iter().any(|e| e.contains("stock")));
        assert!(errors.iter().any(|e| e.contains("replacement_cycle_months")));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let errors = validate_catalog(&parse("categories: []"));
        assert_eq!(errors, vec!["catalog has no categories".to_string()]);
    }
}
