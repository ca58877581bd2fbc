//! Category and product browsing.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use purewell_core::models::CategoryTree;
use purewell_core::{CategoryId, Page, PageRequest, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::services::catalog::{ProductDetail, ProductSummary};
use crate::state::AppState;

/// Product listing filters.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category_id: Option<CategoryId>,
    pub q: Option<String>,
}

/// GET /api/categories
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<CategoryTree>> {
    let tree = state.catalog().category_tree(state.pool()).await?;
    Ok(Json(CategoryTree::clone(&tree)))
}

/// Visible products, priced for the viewer.
///
/// GET /api/products?category_id=&q=&page=&per_page=
#[instrument(skip(state, member))]
pub async fn products(
    State(state): State<AppState>,
    OptionalAuth(member): OptionalAuth,
    Query(query): Query<ProductQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<ProductSummary>>> {
    let viewer = member.map(|m| m.member_type);
    let products = state
        .catalog()
        .list_products(state.pool(), viewer, query.category_id, query.q, page)
        .await?;
    Ok(Json(products))
}

/// GET /api/products/{id}
#[instrument(skip(state, member))]
pub async fn product(
    State(state): State<AppState>,
    OptionalAuth(member): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    let viewer = member.map(|m| m.member_type);
    let detail = state
        .catalog()
        .product_detail(state.pool(), viewer, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(Json(detail))
}
