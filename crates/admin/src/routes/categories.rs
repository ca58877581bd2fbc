//! Category maintenance. The hierarchy is exactly two levels deep.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, instrument};

use purewell_core::models::{Category, CategoryTree};
use purewell_core::CategoryId;

use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    /// Omit for a main category.
    pub parent_id: Option<CategoryId>,
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategory {
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
}

/// GET /api/admin/categories
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<CategoryTree>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(CategoryTree::build(categories)))
}

/// POST /api/admin/categories
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, name = %req.name))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(req): Json<CreateCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    let name = required_name(&req.name)?;
    let categories = CategoryRepository::new(state.pool());

    if let Some(parent_id) = req.parent_id {
        let parent = categories
            .get(parent_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Parent category not found".to_string()))?;
        ensure_main(&parent)?;
    }

    let category = categories.create(req.parent_id, name, req.sort_order).await?;
    info!(category_id = %category.id, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/admin/categories/{id}
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
    Json(req): Json<UpdateCategory>,
) -> Result<Json<Category>> {
    let name = required_name(&req.name)?;
    let category = CategoryRepository::new(state.pool())
        .update(id, name, req.sort_order)
        .await?;
    Ok(Json(category))
}

/// DELETE /api/admin/categories/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    CategoryRepository::new(state.pool()).delete(id).await?;
    info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn required_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Category name is required".to_string()));
    }
    Ok(name)
}

/// Sub categories may only hang off main categories.
fn ensure_main(parent: &Category) -> Result<()> {
    if parent.is_main() {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Sub categories cannot have their own sub categories".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_of_sub_rejected() {
        let main = Category {
            id: CategoryId::new(1),
            parent_id: None,
            name: "Water purifiers".to_string(),
            sort_order: 0,
        };
        let sub = Category {
            id: CategoryId::new(2),
            parent_id: Some(CategoryId::new(1)),
            name: "Under-sink".to_string(),
            sort_order: 0,
        };
        assert!(ensure_main(&main).is_ok());
        assert!(ensure_main(&sub).is_err());
    }

    #[test]
    fn test_required_name() {
        assert_eq!(required_name("  Cartridges ").unwrap(), "Cartridges");
        assert!(required_name("   ").is_err());
    }
}
