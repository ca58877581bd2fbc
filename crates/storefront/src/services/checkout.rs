//! Checkout, payment completion and customer cancellation.
//!
//! Flow:
//! 1. `quote` prices the cart (no writes)
//! 2. `place_order` re-quotes and stores a `pending_payment` order
//! 3. the browser pays through the gateway SDK using the order number as
//!    `merchant_uid`
//! 4. `complete` (browser) or `reconcile` (webhook) confirms the payment
//!    with the gateway and applies it in one transaction
//!
//! Whenever a confirmed payment cannot be applied, it is cancelled at the
//! gateway. A pending order it was meant for is cancelled too; an order that
//! already moved on (cancelled, or paid by another payment) is left alone.

use chrono::{Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use purewell_core::models::Order;
use purewell_core::{CheckoutQuote, MemberCouponId, OrderStatus, PhoneNumber};
use purewell_payments::{CancelRequest, GatewayPayment, PaymentClient, PaymentStatus};

use crate::db::orders::{Completion, NewOrderItem, PaymentRecord, Shipping};
use crate::db::{CouponRepository, MemberRepository, OrderRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::CurrentMember;
use crate::services::cart::{CartOwner, CartService, CartView};
use crate::state::AppState;

/// Korea Standard Time offset, used for the date part of order numbers.
const KST_OFFSET_HOURS: i64 = 9;

/// Random part of an order number.
const ORDER_SUFFIX_LEN: usize = 8;

/// `pay_method` recorded when points and coupons cover the whole amount.
const POINTS_ONLY_METHOD: &str = "points";

/// Discounts requested for a checkout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Discounts {
    pub member_coupon_id: Option<MemberCouponId>,
    #[serde(default)]
    pub points: Decimal,
}

/// Delivery details and discounts for a new order.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    pub recipient_name: String,
    pub recipient_phone: String,
    pub postal_code: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub delivery_memo: Option<String>,
    #[serde(flatten)]
    pub discounts: Discounts,
}

/// Priced cart plus the arithmetic.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteView {
    pub cart: CartView,
    #[serde(flatten)]
    pub quote: CheckoutQuote,
}

/// What the browser needs to open the gateway payment window.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub order_number: String,
    pub merchant_uid: String,
    pub merchant_code: String,
    /// Shown in the payment window.
    pub name: String,
    pub amount: Decimal,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_tel: String,
    pub buyer_addr: String,
    pub buyer_postcode: String,
    /// The order was fully covered by points and coupon and is already paid.
    pub paid: bool,
}

/// Checkout service.
pub struct CheckoutService<'a> {
    state: &'a AppState,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn payments(&self) -> &PaymentClient {
        self.state.payments()
    }

    /// Price the cart with the requested discounts. Guests can quote but
    /// have no coupons or points.
    #[instrument(skip(self, session, member))]
    pub async fn quote(
        &self,
        session: &Session,
        member: Option<&CurrentMember>,
        discounts: &Discounts,
    ) -> Result<QuoteView> {
        let owner = member.map_or(CartOwner::Guest(session), CartOwner::Member);
        let cart = CartService::new(self.state.pool()).view(owner).await?;

        let quote = match member {
            Some(member) => self.quote_for(member, &cart, discounts).await?,
            None => {
                if discounts.member_coupon_id.is_some() || !discounts.points.is_zero() {
                    return Err(AppError::Unauthorized(
                        "Sign in to use coupons or points".to_string(),
                    ));
                }
                self.state.config().checkout.quote(
                    &cart.checkout_lines(),
                    None,
                    Decimal::ZERO,
                    Decimal::ZERO,
                    None,
                    Utc::now(),
                )?
            }
        };

        Ok(QuoteView { cart, quote })
    }

    async fn quote_for(
        &self,
        member: &CurrentMember,
        cart: &CartView,
        discounts: &Discounts,
    ) -> Result<CheckoutQuote> {
        let pool = self.state.pool();

        let coupon = match discounts.member_coupon_id {
            Some(id) => {
                let issued = CouponRepository::new(pool)
                    .get_issued(member.id, id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;
                if issued.used_at.is_some() {
                    return Err(AppError::BadRequest("Coupon was already used".to_string()));
                }
                Some(issued.terms())
            }
            None => None,
        };

        let balance = MemberRepository::new(pool).points_balance(member.id).await?;

        let quote = self.state.config().checkout.quote(
            &cart.checkout_lines(),
            coupon.as_ref(),
            discounts.points,
            balance,
            Some(member.member_type),
            Utc::now(),
        )?;
        Ok(quote)
    }

    /// Create a `pending_payment` order from the member's cart.
    #[instrument(skip(self, member, form), fields(member_id = %member.id))]
    pub async fn place_order(&self, member: &CurrentMember, form: &PlaceOrder) -> Result<PaymentRequest> {
        let pool = self.state.pool();
        let shipping = validate_shipping(form)?;

        let cart = CartService::new(pool)
            .view(CartOwner::Member(member))
            .await?;
        if let Some(line) = cart.first_unavailable() {
            return Err(AppError::Conflict(format!(
                "{} is not available in the requested quantity",
                line.name
            )));
        }

        let quote = self.quote_for(member, &cart, &form.discounts).await?;

        let items: Vec<NewOrderItem> = cart
            .lines
            .iter()
            .map(|l| NewOrderItem {
                product_id: l.product_id,
                product_name: l.name.clone(),
                unit_price: l.unit_price,
                quantity: l.quantity,
            })
            .collect();

        let order_number = generate_order_number();
        let order = OrderRepository::new(pool)
            .create(
                &order_number,
                member.id,
                &shipping,
                &quote,
                form.discounts.member_coupon_id,
                &items,
            )
            .await?;

        info!(order_number = %order.order_number, total = %order.total, "Order created");
        add_breadcrumb(
            "checkout",
            "Order created",
            Some(&[("order_number", order.order_number.as_str())]),
        );

        let mut paid = false;
        if order.total.is_zero() {
            self.apply_payment(&order, &order.order_number, Some(POINTS_ONLY_METHOD), None)
                .await?;
            paid = true;
        }

        Ok(PaymentRequest {
            merchant_uid: order.order_number.clone(),
            merchant_code: self.payments().merchant_code().to_string(),
            name: order_title(&cart),
            amount: order.total,
            buyer_name: order.recipient_name.clone(),
            buyer_email: member.email.as_str().to_string(),
            buyer_tel: buyer_tel(&order.recipient_phone),
            buyer_addr: format!("{} {}", order.address_line1, order.address_line2)
                .trim()
                .to_string(),
            buyer_postcode: order.postal_code.clone(),
            order_number: order.order_number,
            paid,
        })
    }

    /// Confirm a payment reported by the browser.
    #[instrument(skip(self, member), fields(member_id = %member.id))]
    pub async fn complete(
        &self,
        member: &CurrentMember,
        imp_uid: &str,
        merchant_uid: &str,
    ) -> Result<Order> {
        let order = OrderRepository::new(self.state.pool())
            .find_by_number(merchant_uid)
            .await?
            .filter(|o| o.member_id == member.id)
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        let payment = self.payments().get_payment(imp_uid).await?;
        if payment.merchant_uid != order.order_number {
            return Err(AppError::BadRequest(
                "Payment does not belong to this order".to_string(),
            ));
        }

        self.settle(order, &payment).await
    }

    /// Reconcile a payment named by a gateway notification.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, imp_uid: &str, merchant_uid: &str) -> Result<Option<Order>> {
        let payment = self.payments().get_payment(imp_uid).await?;
        if payment.merchant_uid != merchant_uid {
            warn!(
                reported = %merchant_uid,
                actual = %payment.merchant_uid,
                "Webhook merchant_uid does not match payment"
            );
            return Err(AppError::BadRequest("merchant_uid mismatch".to_string()));
        }

        let Some(order) = OrderRepository::new(self.state.pool())
            .find_by_number(&payment.merchant_uid)
            .await?
        else {
            warn!(merchant_uid = %payment.merchant_uid, "Webhook for unknown order");
            return Ok(None);
        };

        match payment.status {
            PaymentStatus::Paid => self.settle(order, &payment).await.map(Some),
            PaymentStatus::Cancelled | PaymentStatus::Failed
                if order.status == OrderStatus::PendingPayment =>
            {
                let cancelled = OrderRepository::new(self.state.pool())
                    .cancel_pending(order.id)
                    .await?;
                info!(order_number = %order.order_number, "Pending order closed by gateway");
                Ok(cancelled)
            }
            _ => Ok(Some(order)),
        }
    }

    /// Verify the gateway payment against the order and apply it.
    async fn settle(&self, order: Order, payment: &GatewayPayment) -> Result<Order> {
        match settlement(&order, payment) {
            Settlement::AlreadyApplied => Ok(order),
            Settlement::Apply => {
                self.apply_payment(
                    &order,
                    &payment.imp_uid,
                    payment.pay_method.as_deref(),
                    Some(payment),
                )
                .await
            }
            Settlement::Refund(reason) => {
                warn!(
                    order_number = %order.order_number,
                    imp_uid = %payment.imp_uid,
                    status = %order.status,
                    "Captured payment for an order that cannot take it"
                );
                self.refund(&order, &payment.imp_uid, &reason).await?;
                Err(AppError::Conflict(reason))
            }
            Settlement::RefundAndClose(reason) => {
                warn!(
                    order_number = %order.order_number,
                    expected = %order.total,
                    paid = %payment.amount,
                    "Payment amount mismatch"
                );
                self.refund_and_close(&order, &payment.imp_uid, &reason)
                    .await?;
                Err(AppError::BadRequest(reason))
            }
            Settlement::NotAccepting(reason) => Err(AppError::Conflict(reason)),
            Settlement::Unpaid(reason) => Err(AppError::BadRequest(reason)),
        }
    }

    async fn apply_payment(
        &self,
        order: &Order,
        payment_id: &str,
        pay_method: Option<&str>,
        gateway: Option<&GatewayPayment>,
    ) -> Result<Order> {
        let record = PaymentRecord {
            payment_id,
            pay_method,
            paid_at: gateway.and_then(GatewayPayment::paid_at).unwrap_or_else(Utc::now),
        };

        let outcome = OrderRepository::new(self.state.pool())
            .complete_payment(order.id, record)
            .await?;

        let reason = match outcome {
            Completion::Completed(paid) => {
                info!(order_number = %paid.order_number, "Payment applied");
                return Ok(paid);
            }
            Completion::AlreadyPaid(paid) => return Ok(paid),
            Completion::NotPending(status) => {
                // Moved on between the lookup and the lock.
                let reason = format!("Order is {status} and cannot accept a payment");
                if gateway.is_some() {
                    self.refund(order, payment_id, &reason).await?;
                }
                return Err(AppError::Conflict(reason));
            }
            Completion::OutOfStock(product_id) => format!("Product {product_id} is out of stock"),
            Completion::CouponUnavailable => "Coupon is no longer available".to_string(),
            Completion::PointsUnavailable => "Not enough points".to_string(),
        };

        warn!(order_number = %order.order_number, %reason, "Payment could not be applied");
        if gateway.is_some() {
            self.refund_and_close(order, payment_id, &reason).await?;
        } else {
            OrderRepository::new(self.state.pool())
                .cancel_pending(order.id)
                .await?;
        }
        Err(AppError::Conflict(reason))
    }

    /// Cancel a captured payment at the gateway. A failure surfaces as a
    /// server error so the gateway keeps retrying its notification.
    async fn refund(&self, order: &Order, imp_uid: &str, reason: &str) -> Result<()> {
        self.payments()
            .cancel_payment(&CancelRequest::full(imp_uid, reason))
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    order_number = %order.order_number,
                    imp_uid = %imp_uid,
                    "Failed to cancel payment at gateway"
                );
                AppError::from(e)
            })?;

        info!(order_number = %order.order_number, imp_uid = %imp_uid, %reason, "Payment refunded");
        Ok(())
    }

    /// Refund a gateway payment and cancel the pending order it was meant
    /// for. The order is closed even when the refund fails.
    async fn refund_and_close(&self, order: &Order, imp_uid: &str, reason: &str) -> Result<()> {
        let refunded = self.refund(order, imp_uid, reason).await;
        OrderRepository::new(self.state.pool())
            .cancel_pending(order.id)
            .await?;
        refunded
    }

    /// Customer cancellation. Unpaid orders are just closed; paid orders are
    /// refunded in full and their stock, coupon and points restored.
    ///
    /// The order stays locked from before the gateway refund until the
    /// reversal commits.
    #[instrument(skip(self, member), fields(member_id = %member.id))]
    pub async fn cancel(&self, member: &CurrentMember, order_number: &str) -> Result<Order> {
        let orders = OrderRepository::new(self.state.pool());
        let order = orders
            .find_by_number(order_number)
            .await?
            .filter(|o| o.member_id == member.id)
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        if order.status == OrderStatus::PendingPayment
            && let Some(cancelled) = orders.cancel_pending(order.id).await?
        {
            info!(order_number = %cancelled.order_number, "Unpaid order cancelled by customer");
            return Ok(cancelled);
        }

        let reversal = orders.begin_reversal(order.id).await?;
        let status = reversal.order().status;
        if status != OrderStatus::Paid {
            return Err(AppError::Conflict(format!(
                "Order is {status} and can no longer be cancelled"
            )));
        }

        if let Some(payment_id) = reversal.order().gateway_payment_id() {
            self.payments()
                .cancel_payment(&CancelRequest::full(payment_id, "Cancelled by customer"))
                .await?;
        }

        let cancelled = reversal
            .finish(OrderStatus::Cancelled)
            .await
            .map_err(|e| unrecorded_refund(&order.order_number, &e))?;

        info!(order_number = %cancelled.order_number, "Order cancelled by customer");
        Ok(cancelled)
    }
}

/// What to do with a gateway payment reported for an order.
#[derive(Debug, PartialEq, Eq)]
enum Settlement {
    /// This payment was applied earlier.
    AlreadyApplied,
    /// Verified against a pending order.
    Apply,
    /// Money was captured for an order that can no longer take it. Refund
    /// and leave the order as it is.
    Refund(String),
    /// Money was captured for the wrong amount. Refund and close the order.
    RefundAndClose(String),
    /// Nothing was captured and the order cannot take a payment.
    NotAccepting(String),
    /// The payment is not completed.
    Unpaid(String),
}

fn settlement(order: &Order, payment: &GatewayPayment) -> Settlement {
    let captured = payment.status == PaymentStatus::Paid;

    if order.status.is_paid() && order.payment_id.as_deref() == Some(payment.imp_uid.as_str()) {
        return Settlement::AlreadyApplied;
    }

    if order.status != OrderStatus::PendingPayment {
        let reason = format!("Order is {} and cannot accept a payment", order.status);
        return if captured {
            Settlement::Refund(reason)
        } else {
            Settlement::NotAccepting(reason)
        };
    }

    if !captured {
        return Settlement::Unpaid(format!(
            "Payment is {}",
            payment.fail_reason.as_deref().unwrap_or("not completed")
        ));
    }

    if !payment.settles(order.total) {
        return Settlement::RefundAndClose("Paid amount does not match the order".to_string());
    }

    Settlement::Apply
}

/// The gateway refunded the payment but the order could not be updated.
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

fn validate_shipping(form: &PlaceOrder) -> Result<Shipping<'_>> {
    let required = |value: &str, field: &str| -> Result<()> {
        if value.trim().is_empty() {
            Err(AppError::BadRequest(format!("{field} is required")))
        } else {
            Ok(())
        }
    };
    required(&form.recipient_name, "recipient_name")?;
    required(&form.postal_code, "postal_code")?;
    required(&form.address_line1, "address_line1")?;
    PhoneNumber::parse(&form.recipient_phone)
        .map_err(|e| AppError::BadRequest(format!("Invalid recipient phone: {e}")))?;

    Ok(Shipping {
        recipient_name: form.recipient_name.trim(),
        recipient_phone: form.recipient_phone.trim(),
        postal_code: form.postal_code.trim(),
        address_line1: form.address_line1.trim(),
        address_line2: form.address_line2.trim(),
        delivery_memo: form
            .delivery_memo
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty()),
    })
}

/// Gateways expect the phone number without separators.
fn buyer_tel(recipient_phone: &str) -> String {
    PhoneNumber::parse(recipient_phone)
        .map_or_else(|_| recipient_phone.to_string(), |phone| phone.digits())
}

/// Payment window title: first product name plus a count of the rest.
fn order_title(cart: &CartView) -> String {
    match cart.lines.as_slice() {
        [] => "Purewell order".to_string(),
        [only] => only.name.clone(),
        [first, rest @ ..] => format!("{} and {} more", first.name, rest.len()),
    }
}

/// `YYYYMMDD-XXXXXXXX`: date in Korea time plus random upper-case
/// alphanumerics.
#[must_use]
pub fn generate_order_number() -> String {
    let date = (Utc::now() + Duration::hours(KST_OFFSET_HOURS)).format("%Y%m%d");
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ORDER_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{date}-{suffix}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::response::IntoResponse;
    use purewell_core::{MemberId, OrderId, PriceView, ProductId};

    use super::*;
    use crate::services::cart::CartLine;

    const ORDER_NUMBER: &str = "20261016-7QK2M9ZD";

    fn order(status: OrderStatus, payment_id: Option<&str>) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(7),
            order_number: ORDER_NUMBER.to_string(),
            member_id: MemberId::new(3),
            status,
            recipient_name: "Kim Minji".to_string(),
            recipient_phone: "010-1234-5678".to_string(),
            postal_code: "06236".to_string(),
            address_line1: "123 Teheran-ro".to_string(),
            address_line2: String::new(),
            delivery_memo: None,
            subtotal: Decimal::from(10_000),
            coupon_discount: Decimal::ZERO,
            points_used: Decimal::ZERO,
            shipping_fee: Decimal::from(3_000),
            total: Decimal::from(13_000),
            earned_points: Decimal::from(100),
            member_coupon_id: None,
            payment_id: payment_id.map(str::to_string),
            pay_method: None,
            paid_at: None,
            tracking_number: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn payment(imp_uid: &str, status: PaymentStatus, amount: i64) -> GatewayPayment {
        GatewayPayment {
            imp_uid: imp_uid.to_string(),
            merchant_uid: ORDER_NUMBER.to_string(),
            status,
            amount: Decimal::from(amount),
            cancel_amount: Decimal::ZERO,
            pay_method: Some("card".to_string()),
            paid_at: 1_760_600_000,
            fail_reason: None,
        }
    }

    fn line(name: &str) -> CartLine {
        CartLine {
            product_id: ProductId::new(1),
            name: name.to_string(),
            model_code: "X".to_string(),
            image_url: None,
            quantity: 1,
            price: PriceView::Customer {
                price: Decimal::from(1_000),
            },
            unit_price: Decimal::from(1_000),
            line_total: Decimal::from(1_000),
            available: true,
        }
    }

    fn form() -> PlaceOrder {
        PlaceOrder {
            recipient_name: " Kim Minji ".to_string(),
            recipient_phone: "010-1234-5678".to_string(),
            postal_code: "06236".to_string(),
            address_line1: "123 Teheran-ro".to_string(),
            address_line2: String::new(),
            delivery_memo: Some("  ".to_string()),
            discounts: Discounts::default(),
        }
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        let (date, suffix) = number.split_once('-').unwrap();
        assert_eq!(date.len(), 8);
        assert!(date.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(suffix.len(), ORDER_SUFFIX_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_order_numbers_differ() {
        assert_ne!(generate_order_number(), generate_order_number());
    }

    #[test]
    fn test_order_title() {
        let mut cart = CartView::default();
        assert_eq!(order_title(&cart), "Purewell order");
        cart.lines.push(line("Sediment Filter"));
        assert_eq!(order_title(&cart), "Sediment Filter");
        cart.lines.push(line("Carbon Filter"));
        cart.lines.push(line("RO Membrane"));
        assert_eq!(order_title(&cart), "Sediment Filter and 2 more");
    }

    #[test]
    fn test_validate_shipping_trims() {
        let form = form();
        let shipping = validate_shipping(&form).unwrap();
        assert_eq!(shipping.recipient_name, "Kim Minji");
        assert_eq!(shipping.delivery_memo, None);
    }

    #[test]
    fn test_validate_shipping_rejects_missing_address() {
        let mut form = form();
        form.address_line1 = "  ".to_string();
        assert!(matches!(
            validate_shipping(&form),
            Err(AppError::BadRequest(_))
        ));

        let mut form = self::form();
        form.recipient_phone = "12345".to_string();
        assert!(matches!(
            validate_shipping(&form),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_discounts_default_points() {
        let discounts: Discounts = serde_json::from_str(r#"{"member_coupon_id": 4}"#).unwrap();
        assert_eq!(discounts.points, Decimal::ZERO);
        assert_eq!(discounts.member_coupon_id, Some(MemberCouponId::new(4)));
    }

    #[test]
    fn test_settlement_applies_matching_payment() {
        let pending = order(OrderStatus::PendingPayment, None);
        let paid = payment("imp_100", PaymentStatus::Paid, 13_000);
        assert_eq!(settlement(&pending, &paid), Settlement::Apply);
    }

    #[test]
    fn test_settlement_replay_is_idempotent() {
        let paid = payment("imp_100", PaymentStatus::Paid, 13_000);
        for status in [OrderStatus::Paid, OrderStatus::Preparing, OrderStatus::Delivered] {
            assert_eq!(
                settlement(&order(status, Some("imp_100")), &paid),
                Settlement::AlreadyApplied,
                "{status}"
            );
        }
    }

    #[test]
    fn test_settlement_refunds_payment_for_cancelled_order() {
        let cancelled = order(OrderStatus::Cancelled, None);
        let paid = payment("imp_100", PaymentStatus::Paid, 13_000);
        assert!(matches!(settlement(&cancelled, &paid), Settlement::Refund(_)));
    }

    #[test]
    fn test_settlement_refunds_second_payment() {
        let already = order(OrderStatus::Paid, Some("imp_100"));
        let second = payment("imp_200", PaymentStatus::Paid, 13_000);
        assert!(matches!(settlement(&already, &second), Settlement::Refund(_)));
    }

    #[test]
    fn test_settlement_refunds_and_closes_on_amount_mismatch() {
        let pending = order(OrderStatus::PendingPayment, None);
        let short = payment("imp_100", PaymentStatus::Paid, 1_000);
        assert_eq!(
            settlement(&pending, &short),
            Settlement::RefundAndClose("Paid amount does not match the order".to_string())
        );

        let mut partly_cancelled = payment("imp_100", PaymentStatus::Paid, 13_000);
        partly_cancelled.cancel_amount = Decimal::from(3_000);
        assert!(matches!(
            settlement(&pending, &partly_cancelled),
            Settlement::RefundAndClose(_)
        ));
    }

    #[test]
    fn test_settlement_rejects_uncaptured_payment() {
        let pending = order(OrderStatus::PendingPayment, None);
        let mut failed = payment("imp_100", PaymentStatus::Failed, 13_000);
        failed.fail_reason = Some("card declined".to_string());
        assert_eq!(
            settlement(&pending, &failed),
            Settlement::Unpaid("Payment is card declined".to_string())
        );

        let ready = payment("imp_100", PaymentStatus::Ready, 13_000);
        assert_eq!(
            settlement(&pending, &ready),
            Settlement::Unpaid("Payment is not completed".to_string())
        );

        let cancelled = order(OrderStatus::Cancelled, None);
        assert!(matches!(
            settlement(&cancelled, &failed),
            Settlement::NotAccepting(_)
        ));
    }

    #[test]
    fn test_buyer_tel_strips_separators() {
        assert_eq!(buyer_tel("010-1234-5678"), "01012345678");
        assert_eq!(buyer_tel("02 123 4567"), "021234567");
    }

    #[test]
    fn test_unrecorded_refund_is_a_server_error() {
        let err = unrecorded_refund(ORDER_NUMBER, &sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::Internal(ref m) if m.contains(ORDER_NUMBER)));
        assert_eq!(
            err.into_response().status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
