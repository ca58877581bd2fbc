//! Order administration.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use purewell_core::models::{Member, Order, OrderItem};
use purewell_core::{OrderId, OrderStatus, Page, PageRequest};

use crate::db::orders::{OrderFilter, OrderRow};
use crate::db::{MemberRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::services::OrderService;
use crate::state::AppState;

const DEFAULT_CANCEL_REASON: &str = "Cancelled by Purewell";

/// An order with its items and buyer.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub member: Option<Member>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    /// Required when moving to `shipping`.
    pub tracking_number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// GET /api/admin/orders
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(filter): Query<OrderFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<OrderRow>>> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(AppError::BadRequest("from must not be after to".to_string()));
    }

    let (items, total) = OrderRepository::new(state.pool())
        .list(&filter, page)
        .await?;
    Ok(Json(Page::new(items, page, total)))
}

/// GET /api/admin/orders/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    let items = orders.items(order.id).await?;
    let member = MemberRepository::new(state.pool())
        .get(order.member_id)
        .await?;

    Ok(Json(OrderDetail {
        order,
        items,
        member,
    }))
}

/// PATCH /api/admin/orders/{id}/status
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, status = %req.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let order = OrderService::new(&state)
        .advance(id, req.status, req.tracking_number.as_deref())
        .await?;
    Ok(Json(order))
}

/// Cancel or refund an order in full.
///
/// POST /api/admin/orders/{id}/cancel
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    req: Option<Json<CancelRequest>>,
) -> Result<Json<Order>> {
    let reason = req
        .and_then(|Json(r)| r.reason)
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());

    let order = OrderService::new(&state).cancel(id, &reason).await?;
    Ok(Json(order))
}
