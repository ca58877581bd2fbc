//! Order fulfilment and reversals from the back office.
//!
//! Forward moves (`paid → preparing → shipping → delivered`) are plain status
//! updates. Reversals lock the order, cancel the payment at the gateway and
//! only then put stock, coupon and points back, so a failed gateway call
//! leaves the order untouched and nobody can move it in between.

use tracing::{info, instrument};

use purewell_core::models::Order;
use purewell_core::{OrderId, OrderStatus};
use purewell_payments::CancelRequest;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Order operations that involve more than one table or the gateway.
pub struct OrderService<'a> {
    state: &'a AppState,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Move an order one step along fulfilment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for targets that are not fulfilment
    /// steps or a missing tracking number, and `AppError::Conflict` when the
    /// order is not in the preceding state.
    #[instrument(skip(self, tracking_number), fields(order_id = %id, next = %next))]
    pub async fn advance(
        &self,
        id: OrderId,
        next: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<Order> {
        validate_advance(next, tracking_number)?;
        let tracking_number = tracking_number.map(str::trim).filter(|t| !t.is_empty());

        let orders = OrderRepository::new(self.state.pool());
        let order = orders
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        if !order.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "Order is {} and cannot move to {next}",
                order.status
            )));
        }

        let updated = orders
            .set_status(id, order.status, next, tracking_number)
            .await?
            .ok_or_else(|| AppError::Conflict("Order status changed, try again".to_string()))?;

        info!(order_number = %updated.order_number, status = %updated.status, "Order status updated");
        Ok(updated)
    }

    /// Cancel or refund an order in full.
    ///
    /// Unpaid orders are simply cancelled. Paid orders that have not shipped
    /// become `cancelled`; shipped or delivered ones become `refunded`.
    #[instrument(skip(self, reason), fields(order_id = %id))]
    pub async fn cancel(&self, id: OrderId, reason: &str) -> Result<Order> {
        let order = self.load(id).await?;

        if order.status == OrderStatus::PendingPayment
            && let Some(cancelled) = OrderRepository::new(self.state.pool())
                .cancel_pending(id)
                .await?
        {
            info!(order_number = %cancelled.order_number, "Unpaid order cancelled by admin");
            return Ok(cancelled);
        }

        self.reverse(id, reason, cancel_target).await
    }

    /// Refund a paid order in full, whatever its fulfilment stage.
    #[instrument(skip(self, reason), fields(order_id = %id))]
    pub async fn refund(&self, id: OrderId, reason: &str) -> Result<Order> {
        self.reverse(id, reason, refund_target).await
    }

    async fn load(&self, id: OrderId) -> Result<Order> {
        OrderRepository::new(self.state.pool())
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
    }

    /// Lock the order, refund it at the gateway, then put stock, coupon and
    /// points back. A gateway failure releases the lock with nothing changed.
    async fn reverse(
        &self,
        id: OrderId,
        reason: &str,
        target_of: fn(OrderStatus) -> Result<OrderStatus>,
    ) -> Result<Order> {
        let reversal = OrderRepository::new(self.state.pool())
            .begin_reversal(id)
            .await?;
        let from = reversal.order().status;
        let target = target_of(from)?;
        let order_number = reversal.order().order_number.clone();

        if let Some(payment_id) = reversal.order().gateway_payment_id() {
            self.state
                .payments()
                .cancel_payment(&CancelRequest::full(payment_id, reason))
                .await?;
        }

        let reversed = reversal
            .finish(target)
            .await
            .map_err(|e| unrecorded_refund(&order_number, &e))?;

        info!(
            order_number = %reversed.order_number,
            from = %from,
            to = %reversed.status,
            "Order reversed by admin"
        );
        Ok(reversed)
    }
}

/// The gateway refunded the payment but the order could not be updated.
/// Someone has to restore the order by hand, so this is a server error.
fn unrecorded_refund(order_number: &str, err: &sqlx::Error) -> AppError {
    tracing::error!(
        error = %err,
        order_number = %order_number,
        "Payment refunded at gateway but the order reversal failed"
    );
    AppError::Internal(format!(
        "Order {order_number} was refunded but could not be updated"
    ))
}

fn cancel_target(status: OrderStatus) -> Result<OrderStatus> {
    reversal_target(status).ok_or_else(|| {
        AppError::Conflict(format!("Order is {status} and cannot be cancelled"))
    })
}

fn refund_target(status: OrderStatus) -> Result<OrderStatus> {
    if status.can_transition_to(OrderStatus::Refunded) {
        Ok(OrderStatus::Refunded)
    } else {
        Err(AppError::Conflict(format!(
            "Order is {status} and cannot be refunded"
        )))
    }
}

/// Where a paid order goes when an admin cancels it.
#[must_use]
pub const fn reversal_target(status: OrderStatus) -> Option<OrderStatus> {
    match status {
        OrderStatus::Paid | OrderStatus::Preparing => Some(OrderStatus::Cancelled),
        OrderStatus::Shipping | OrderStatus::Delivered => Some(OrderStatus::Refunded),
        OrderStatus::PendingPayment | OrderStatus::Cancelled | OrderStatus::Refunded => None,
    }
}

fn validate_advance(next: OrderStatus, tracking_number: Option<&str>) -> Result<()> {
    match next {
        OrderStatus::Preparing | OrderStatus::Delivered => Ok(()),
        OrderStatus::Shipping => {
            if tracking_number.is_some_and(|t| !t.trim().is_empty()) {
                Ok(())
            } else {
                Err(AppError::BadRequest(
                    "A tracking number is required to mark an order as shipping".to_string(),
                ))
            }
        }
        other => Err(AppError::BadRequest(format!(
            "Use cancel or refund instead of setting {other} directly"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reversal_target() {
        assert_eq!(reversal_target(OrderStatus::Paid), Some(OrderStatus::Cancelled));
        assert_eq!(reversal_target(OrderStatus::Preparing), Some(OrderStatus::Cancelled));
        assert_eq!(reversal_target(OrderStatus::Shipping), Some(OrderStatus::Refunded));
        assert_eq!(reversal_target(OrderStatus::Delivered), Some(OrderStatus::Refunded));
        assert_eq!(reversal_target(OrderStatus::Refunded), None);
        assert_eq!(reversal_target(OrderStatus::PendingPayment), None);
    }

    #[test]
    fn test_reversal_targets_are_allowed_transitions() {
        for status in OrderStatus::ALL {
            if let Some(target) = reversal_target(*status) {
                assert!(status.can_transition_to(target), "{status} -> {target}");
            }
        }
    }

    #[test]
    fn test_cancel_and_refund_targets() {
        assert_eq!(cancel_target(OrderStatus::Preparing).unwrap(), OrderStatus::Cancelled);
        assert_eq!(cancel_target(OrderStatus::Delivered).unwrap(), OrderStatus::Refunded);
        assert!(matches!(
            cancel_target(OrderStatus::Cancelled),
            Err(AppError::Conflict(_))
        ));

        assert_eq!(refund_target(OrderStatus::Paid).unwrap(), OrderStatus::Refunded);
        assert_eq!(refund_target(OrderStatus::Shipping).unwrap(), OrderStatus::Refunded);
        assert!(matches!(
            refund_target(OrderStatus::PendingPayment),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            refund_target(OrderStatus::Refunded),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_unrecorded_refund_is_a_server_error() {
        let err = unrecorded_refund("20261016-7QK2M9ZD", &sqlx::Error::PoolTimedOut);
        match err {
            AppError::Internal(message) => assert!(message.contains("20261016-7QK2M9ZD")),
            other => panic!("expected an internal error, got {other:?}"),
        }
    }

    #[test]
    fn test_shipping_requires_tracking_number() {
        assert!(validate_advance(OrderStatus::Shipping, Some("6081-2233-4455")).is_ok());
        assert!(validate_advance(OrderStatus::Shipping, Some("  ")).is_err());
        assert!(validate_advance(OrderStatus::Shipping, None).is_err());
        assert!(validate_advance(OrderStatus::Preparing, None).is_ok());
        assert!(validate_advance(OrderStatus::Delivered, None).is_ok());
    }

    #[test]
    fn test_reversal_statuses_cannot_be_set_directly() {
        assert!(validate_advance(OrderStatus::Cancelled, None).is_err());
        assert!(validate_advance(OrderStatus::Refunded, None).is_err());
        assert!(validate_advance(OrderStatus::Paid, None).is_err());
    }
}
