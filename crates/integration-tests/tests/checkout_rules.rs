//! Pricing, checkout and order lifecycle rules across crates.
//!
//! No servers or database needed.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use purewell_admin::services::orders::reversal_target;
use purewell_core::{
    CheckoutError, CheckoutLine, CheckoutPolicy, CouponTerms, DiscountKind, MemberType,
    OrderStatus, PriceView, ProductId,
};
use rust_decimal::Decimal;

fn won(amount: i64) -> Decimal {
    Decimal::from(amount)
}

/// One cartridge priced for `viewer`, as the storefront would build the line.
fn line_for(viewer: Option<MemberType>, quantity: i32) -> CheckoutLine {
    let price = PriceView::resolve(viewer, won(48_000), won(39_000));
    CheckoutLine {
        product_id: ProductId::new(1),
        unit_price: price.charged(),
        quantity,
    }
}

fn welcome_coupon() -> CouponTerms {
    CouponTerms {
        kind: DiscountKind::Percent,
        value: won(10),
        max_discount: Some(won(5_000)),
        min_order_amount: won(30_000),
        starts_at: Utc::now() - Duration::days(1),
        ends_at: Some(Utc::now() + Duration::days(30)),
    }
}

#[test]
fn test_branch_pays_business_price_and_earns_nothing() {
    let policy = CheckoutPolicy::default();
    let viewer = Some(MemberType::Branch);
    let quote = policy
        .quote(
            &[line_for(viewer, 2)],
            None,
            Decimal::ZERO,
            Decimal::ZERO,
            viewer,
            Utc::now(),
        )
        .unwrap();

    assert_eq!(quote.subtotal, won(78_000));
    assert_eq!(quote.shipping_fee, Decimal::ZERO);
    assert_eq!(quote.total, won(78_000));
    assert_eq!(quote.earned_points, Decimal::ZERO);
}

#[test]
fn test_admin_pays_customer_price() {
    let viewer = Some(MemberType::Admin);
    let quote = CheckoutPolicy::default()
        .quote(
            &[line_for(viewer, 1)],
            None,
            Decimal::ZERO,
            Decimal::ZERO,
            viewer,
            Utc::now(),
        )
        .unwrap();
    assert_eq!(quote.subtotal, won(48_000));
    assert_eq!(quote.earned_points, Decimal::ZERO);
}

#[test]
fn test_individual_with_coupon_and_points() {
    let viewer = Some(MemberType::Individual);
    let quote = CheckoutPolicy::default()
        .quote(
            &[line_for(viewer, 1)],
            Some(&welcome_coupon()),
            won(2_000),
            won(10_000),
            viewer,
            Utc::now(),
        )
        .unwrap();

    // 10% of 48,000 capped at 5,000 -> 4,800; shipping under 50,000.
    assert_eq!(quote.coupon_discount, won(4_800));
    assert_eq!(quote.points_used, won(2_000));
    assert_eq!(quote.shipping_fee, won(3_000));
    assert_eq!(quote.total, won(44_200));
    // 1% of what was paid for goods.
    assert_eq!(quote.earned_points, won(412));
}

#[test]
fn test_points_beyond_balance_rejected() {
    let viewer = Some(MemberType::Individual);
    let result = CheckoutPolicy::default().quote(
        &[line_for(viewer, 1)],
        None,
        won(5_000),
        won(4_000),
        viewer,
        Utc::now(),
    );
    assert!(matches!(result, Err(CheckoutError::InsufficientPoints { .. })));
}

#[test]
fn test_admin_reversal_matches_transitions() {
    for &status in OrderStatus::ALL {
        match reversal_target(status) {
            Some(target) => {
                assert!(status.is_paid(), "{status}");
                assert!(status.can_transition_to(target), "{status} -> {target}");
            }
            None => assert!(!status.is_paid(), "{status}"),
        }
    }
}

#[test]
fn test_only_unshipped_orders_restock() {
    let restocked: Vec<OrderStatus> = OrderStatus::ALL
        .iter()
        .copied()
        .filter(|s| s.restocks_on_reversal())
        .collect();
    assert_eq!(restocked, vec![OrderStatus::Paid, OrderStatus::Preparing]);
}

#[test]
fn test_customer_cancellation_window_is_narrower_than_admin() {
    for &status in OrderStatus::ALL {
        if status.is_cancellable_by_customer() && status.is_paid() {
            assert_eq!(reversal_target(status), Some(OrderStatus::Cancelled));
        }
    }
}
