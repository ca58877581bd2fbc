//! Order history and customer cancellation.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use tracing::instrument;

use purewell_core::models::{Order, OrderItem};
use purewell_core::{Page, PageRequest};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

/// An order with its items.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// GET /api/orders
#[instrument(skip_all, fields(member_id = %member.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Order>>> {
    let (orders, total) = OrderRepository::new(state.pool())
        .list_for_member(member.id, page)
        .await?;
    Ok(Json(Page::new(orders, page, total)))
}

/// The member's own order, or one placed by a branch of theirs.
///
/// GET /api/orders/{order_number}
#[instrument(skip(state, member), fields(member_id = %member.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Path(order_number): Path<String>,
) -> Result<Json<OrderDetail>> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .find_visible_to(&order_number, member.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    let items = orders.items(order.id).await?;
    Ok(Json(OrderDetail { order, items }))
}

/// POST /api/orders/{order_number}/cancel
#[instrument(skip(state, member), fields(member_id = %member.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Path(order_number): Path<String>,
) -> Result<Json<Order>> {
    let order = CheckoutService::new(&state)
        .cancel(&member, &order_number)
        .await?;
    Ok(Json(order))
}
