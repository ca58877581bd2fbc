//! Product maintenance and stock adjustments.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use purewell_core::models::Product;
use purewell_core::{Page, PageRequest, ProductId};

use crate::db::products::{ProductFilter, ProductInput, Removal};
use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    /// Positive for received goods, negative for write-offs.
    pub delta: i32,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    /// `true` when the product was hidden because orders reference it.
    pub hidden: bool,
}

/// GET /api/admin/products
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(filter): Query<ProductFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Product>>> {
    let (items, total) = ProductRepository::new(state.pool())
        .list(&filter, page)
        .await?;
    Ok(Json(Page::new(items, page, total)))
}

/// GET /api/admin/products/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(Json(product))
}

/// POST /api/admin/products
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id, model_code = %input.model_code))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = validate(input)?;
    ensure_category(&state, &input).await?;

    let product = ProductRepository::new(state.pool()).create(&input).await?;
    info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/admin/products/{id}
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    let input = validate(input)?;
    ensure_category(&state, &input).await?;

    let product = ProductRepository::new(state.pool()).update(id, &input).await?;
    info!(product_id = %product.id, status = %product.status, "Product updated");
    Ok(Json(product))
}

/// Delete a product, or hide it if it was ever ordered.
///
/// DELETE /api/admin/products/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Deleted>> {
    let removal = ProductRepository::new(state.pool()).delete(id).await?;
    info!(product_id = %id, ?removal, "Product removed");
    Ok(Json(Deleted {
        hidden: removal == Removal::Hidden,
    }))
}

/// POST /api/admin/products/{id}/stock
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, delta = req.delta))]
pub async fn adjust_stock(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(req): Json<StockAdjustment>,
) -> Result<Json<Product>> {
    if req.delta == 0 {
        return Err(AppError::BadRequest("delta must not be zero".to_string()));
    }
    let product = ProductRepository::new(state.pool())
        .adjust_stock(id, req.delta)
        .await?;
    info!(product_id = %product.id, stock = product.stock, status = %product.status, "Stock adjusted");
    Ok(Json(product))
}

/// Trim text fields and check prices, stock and the replacement cycle.
fn validate(mut input: ProductInput) -> Result<ProductInput> {
    input.name = input.name.trim().to_string();
    input.model_code = input.model_code.trim().to_string();
    input.summary = input.summary.trim().to_string();
    input.image_url = input
        .image_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    if input.name.is_empty() || input.model_code.is_empty() {
        return Err(AppError::BadRequest(
            "name and model_code are required".to_string(),
        ));
    }
    for (field, price) in [
        ("customer_price", input.customer_price),
        ("business_price", input.business_price),
    ] {
        if price < Decimal::ZERO || price.fract() != Decimal::ZERO {
            return Err(AppError::BadRequest(format!(
                "{field} must be a non-negative whole amount"
            )));
        }
    }
    if input.stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".to_string()));
    }
    if input.replacement_cycle_months.is_some_and(|m| m <= 0) {
        return Err(AppError::BadRequest(
            "replacement_cycle_months must be positive".to_string(),
        ));
    }
    Ok(input)
}

/// Products may be filed under a main or a sub category, but it must exist.
async fn ensure_category(state: &AppState, input: &ProductInput) -> Result<()> {
    CategoryRepository::new(state.pool())
        .get(input.category_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::BadRequest("Category not found".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use purewell_core::{CategoryId, ProductStatus};

    use super::*;

    fn input() -> ProductInput {
        ProductInput {
            category_id: CategoryId::new(1),
            name: " PW-700 Under-sink purifier ".to_string(),
            model_code: "PW-700".to_string(),
            summary: String::new(),
            description: String::new(),
            customer_price: Decimal::from(890_000),
            business_price: Decimal::from(720_000),
            stock: 12,
            status: ProductStatus::OnSale,
            image_url: Some("  ".to_string()),
            replacement_cycle_months: None,
        }
    }

    #[test]
    fn test_validate_trims() {
        let valid = validate(input()).unwrap();
        assert_eq!(valid.name, "PW-700 Under-sink purifier");
        assert_eq!(valid.image_url, None);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut bad = input();
        bad.business_price = Decimal::from(-1);
        assert!(validate(bad).is_err());

        let mut bad = input();
        bad.customer_price = Decimal::new(1005, 1);
        assert!(validate(bad).is_err());

        let mut bad = input();
        bad.stock = -3;
        assert!(validate(bad).is_err());

        let mut bad = input();
        bad.replacement_cycle_months = Some(0);
        assert!(validate(bad).is_err());

        let mut bad = input();
        bad.model_code = "  ".to_string();
        assert!(validate(bad).is_err());
    }
}
