//! Orders and their line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{MemberCouponId, MemberId, OrderId, OrderItemId, OrderStatus, ProductId};

/// An order. Amount columns hold the checkout arithmetic as it was quoted
/// when the order was placed.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Order {
    pub id: OrderId,
    /// `YYYYMMDD-XXXXXXXX`; doubles as the gateway merchant uid.
    pub order_number: String,
    pub member_id: MemberId,
    pub status: OrderStatus,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub postal_code: String,
    pub address_line1: String,
    pub address_line2: String,
    pub delivery_memo: Option<String>,
    pub subtotal: Decimal,
    pub coupon_discount: Decimal,
    pub points_used: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub earned_points: Decimal,
    pub member_coupon_id: Option<MemberCouponId>,
    /// Gateway payment id (`imp_uid`).
    pub payment_id: Option<String>,
    pub pay_method: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The payment to cancel at the gateway when this order is reversed.
    ///
    /// Orders covered entirely by points and coupons never reach the gateway
    /// and carry their own order number as payment id.
    #[must_use]
    pub fn gateway_payment_id(&self) -> Option<&str> {
        self.payment_id
            .as_deref()
            .filter(|id| *id != self.order_number)
    }
}

/// A purchased product. Name and price are copied at order time.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(payment_id: Option<&str>) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(1),
            order_number: "20261016-7QK2M9ZD".to_string(),
            member_id: MemberId::new(3),
            status: OrderStatus::Paid,
            recipient_name: "Kim Minji".to_string(),
            recipient_phone: "010-1234-5678".to_string(),
            postal_code: "06236".to_string(),
            address_line1: "123 Teheran-ro".to_string(),
            address_line2: String::new(),
            delivery_memo: None,
            subtotal: Decimal::from(13_000),
            coupon_discount: Decimal::ZERO,
            points_used: Decimal::ZERO,
            shipping_fee: Decimal::ZERO,
            total: Decimal::from(13_000),
            earned_points: Decimal::from(130),
            member_coupon_id: None,
            payment_id: payment_id.map(str::to_string),
            pay_method: None,
            paid_at: Some(now),
            tracking_number: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_gateway_payment_id() {
        assert_eq!(
            order(Some("imp_448280090638")).gateway_payment_id(),
            Some("imp_448280090638")
        );
        assert_eq!(order(Some("20261016-7QK2M9ZD")).gateway_payment_id(), None);
        assert_eq!(order(None).gateway_payment_id(), None);
    }

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            id: OrderItemId::new(1),
            order_id: OrderId::new(1),
            product_id: ProductId::new(2),
            product_name: "Carbon Block Filter".to_string(),
            unit_price: Decimal::from(12_500),
            quantity: 3,
        };
        assert_eq!(item.line_total(), Decimal::from(37_500));
    }
}
