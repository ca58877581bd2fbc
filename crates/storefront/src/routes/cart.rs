//! Cart endpoints. Guests use the session cart, members the database cart.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use purewell_core::ProductId;

use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::services::cart::{CartOwner, CartService, CartView};
use crate::state::AppState;

/// Add-to-cart body.
#[derive(Debug, Deserialize)]
pub struct AddItem {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: i32,
}

const fn one() -> i32 {
    1
}

/// Quantity change body.
#[derive(Debug, Deserialize)]
pub struct SetQuantity {
    pub quantity: i32,
}

/// GET /api/cart
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(member): OptionalAuth,
) -> Result<Json<CartView>> {
    let owner = member.as_ref().map_or(CartOwner::Guest(&session), CartOwner::Member);
    let cart = CartService::new(state.pool()).view(owner).await?;
    Ok(Json(cart))
}

/// POST /api/cart/items
#[instrument(skip(state, session, member))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(member): OptionalAuth,
    Json(req): Json<AddItem>,
) -> Result<Json<CartView>> {
    let owner = member.as_ref().map_or(CartOwner::Guest(&session), CartOwner::Member);
    let cart = CartService::new(state.pool())
        .add(owner, req.product_id, req.quantity)
        .await?;
    Ok(Json(cart))
}

/// PATCH /api/cart/items/{product_id}
#[instrument(skip(state, session, member))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(member): OptionalAuth,
    Path(product_id): Path<ProductId>,
    Json(req): Json<SetQuantity>,
) -> Result<Json<CartView>> {
    let owner = member.as_ref().map_or(CartOwner::Guest(&session), CartOwner::Member);
    let cart = CartService::new(state.pool())
        .set_quantity(owner, product_id, req.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /api/cart/items/{product_id}
#[instrument(skip(state, session, member))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(member): OptionalAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let owner = member.as_ref().map_or(CartOwner::Guest(&session), CartOwner::Member);
    let cart = CartService::new(state.pool())
        .remove(owner, product_id)
        .await?;
    Ok(Json(cart))
}

/// DELETE /api/cart
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(member): OptionalAuth,
) -> Result<StatusCode> {
    let owner = member.as_ref().map_or(CartOwner::Guest(&session), CartOwner::Member);
    CartService::new(state.pool()).clear(owner).await?;
    Ok(StatusCode::NO_CONTENT)
}
