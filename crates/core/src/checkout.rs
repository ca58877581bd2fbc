//! Coupon, point and shipping arithmetic for checkout.
//!
//! [`CheckoutPolicy::quote`] is the single place an order total is computed.
//! The storefront calls it for the live quote, again when the order is
//! created, and the result is stored on the order row unchanged.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::MAX_LINE_QUANTITY;
use crate::types::{DiscountKind, MemberType, Price, ProductId};

/// Errors from checkout arithmetic. All are client errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("quantity for product {0} must be between 1 and 99")]
    InvalidQuantity(ProductId),

    #[error("coupon is not valid yet")]
    CouponNotStarted,

    #[error("coupon has expired")]
    CouponExpired,

    #[error("coupon requires an order of at least {}", as_won(.minimum))]
    CouponMinimumNotMet { minimum: Decimal },

    #[error("points cannot be negative")]
    NegativePoints,

    #[error("at least {minimum} points must be used at once")]
    PointsBelowMinimum { minimum: Decimal },

    #[error("only {balance} points are available")]
    InsufficientPoints { balance: Decimal },

    #[error("at most {payable} points can be used on this order")]
    PointsExceedPayable { payable: Decimal },
}

fn as_won(amount: &Decimal) -> Price {
    Price::won(*amount)
}

/// One product line as priced for the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    /// Unit price the buyer is charged (see `PriceView::charged`).
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl CheckoutLine {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The parts of a coupon that affect arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouponTerms {
    pub kind: DiscountKind,
    pub value: Decimal,
    pub max_discount: Option<Decimal>,
    pub min_order_amount: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl CouponTerms {
    /// Inside the validity window at `now`. The end bound is exclusive.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && self.ends_at.is_none_or(|end| now < end)
    }

    fn check_window(&self, now: DateTime<Utc>) -> Result<(), CheckoutError> {
        if now < self.starts_at {
            return Err(CheckoutError::CouponNotStarted);
        }
        if self.ends_at.is_some_and(|end| now >= end) {
            return Err(CheckoutError::CouponExpired);
        }
        Ok(())
    }

    /// Discount for `subtotal`, never more than the subtotal itself.
    #[must_use]
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        let raw = match self.kind {
            DiscountKind::Fixed => self.value,
            DiscountKind::Percent => {
                let percent = self.value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
                let discount = (subtotal * percent / Decimal::ONE_HUNDRED).floor();
                self.max_discount
                    .map_or(discount, |cap| discount.min(cap))
            }
        };
        raw.max(Decimal::ZERO).min(subtotal)
    }
}

/// Store-wide checkout constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutPolicy {
    /// Flat delivery fee.
    pub shipping_fee: Decimal,
    /// Subtotal at which delivery becomes free.
    pub free_shipping_threshold: Decimal,
    /// Smallest non-zero point spend.
    pub min_point_use: Decimal,
    /// Fraction of the paid product amount credited to individuals.
    pub individual_earn_rate: Decimal,
    /// Fraction credited to headquarters and branches.
    pub corporate_earn_rate: Decimal,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            shipping_fee: Decimal::from(3_000),
            free_shipping_threshold: Decimal::from(50_000),
            min_point_use: Decimal::from(1_000),
            individual_earn_rate: Decimal::new(1, 2),
            corporate_earn_rate: Decimal::ZERO,
        }
    }
}

/// The computed amounts for one checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckoutQuote {
    pub subtotal: Decimal,
    pub coupon_discount: Decimal,
    pub points_used: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub earned_points: Decimal,
}

impl CheckoutPolicy {
    /// Point earn rate for a buyer. Guests and admins earn nothing.
    #[must_use]
    pub const fn earn_rate(&self, member_type: Option<MemberType>) -> Decimal {
        match member_type {
            Some(MemberType::Individual) => self.individual_earn_rate,
            Some(MemberType::Headquarters | MemberType::Branch) => self.corporate_earn_rate,
            Some(MemberType::Admin) | None => Decimal::ZERO,
        }
    }

    /// Delivery fee for a subtotal.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_fee
        }
    }

    /// Compute the amounts for a checkout.
    ///
    /// 1. subtotal is the sum of line totals
    /// 2. the coupon must be active and its minimum met
    /// 3. points are 0, or between the minimum and both the balance and
    ///    the amount left after the coupon
    /// 4. shipping is decided on the subtotal
    /// 5. points are earned on what was paid for products, excluding shipping
    ///
    /// ```
    /// use purewell_core::{CheckoutLine, CheckoutPolicy, MemberType, ProductId};
    /// use rust_decimal::Decimal;
    ///
    /// let lines = [CheckoutLine {
    ///     product_id: ProductId::new(1),
    ///     unit_price: Decimal::from(18_000),
    ///     quantity: 2,
    /// }];
    /// let quote = CheckoutPolicy::default()
    ///     .quote(
    ///         &lines,
    ///         None,
    ///         Decimal::ZERO,
    ///         Decimal::ZERO,
    ///         Some(MemberType::Individual),
    ///         chrono::Utc::now(),
    ///     )
    ///     .unwrap();
    /// assert_eq!(quote.total, Decimal::from(39_000));
    /// assert_eq!(quote.earned_points, Decimal::from(360));
    /// ```
    pub fn quote(
        &self,
        lines: &[CheckoutLine],
        coupon: Option<&CouponTerms>,
        points_requested: Decimal,
        points_balance: Decimal,
        member_type: Option<MemberType>,
        now: DateTime<Utc>,
    ) -> Result<CheckoutQuote, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if let Some(line) = lines
            .iter()
            .find(|l| !(1..=MAX_LINE_QUANTITY).contains(&l.quantity))
        {
            return Err(CheckoutError::InvalidQuantity(line.product_id));
        }

        let subtotal: Decimal = lines.iter().map(CheckoutLine::line_total).sum();

        let coupon_discount = match coupon {
            Some(terms) => {
                terms.check_window(now)?;
                if subtotal < terms.min_order_amount {
                    return Err(CheckoutError::CouponMinimumNotMet {
                        minimum: terms.min_order_amount,
                    });
                }
                terms.discount_for(subtotal)
            }
            None => Decimal::ZERO,
        };

        let payable = subtotal - coupon_discount;
        let points_used = self.check_points(points_requested, points_balance, payable)?;

        let shipping_fee = self.shipping_for(subtotal);
        let total = (payable - points_used + shipping_fee).max(Decimal::ZERO);
        let earned_points = ((total - shipping_fee).max(Decimal::ZERO)
            * self.earn_rate(member_type))
        .floor();

        Ok(CheckoutQuote {
            subtotal,
            coupon_discount,
            points_used,
            shipping_fee,
            total,
            earned_points,
        })
    }

    fn check_points(
        &self,
        requested: Decimal,
        balance: Decimal,
        payable: Decimal,
    ) -> Result<Decimal, CheckoutError> {
        if requested.is_sign_negative() && !requested.is_zero() {
            return Err(CheckoutError::NegativePoints);
        }
        let requested = requested.trunc();
        if requested.is_zero() {
            return Ok(Decimal::ZERO);
        }
        if requested < self.min_point_use {
            return Err(CheckoutError::PointsBelowMinimum {
                minimum: self.min_point_use,
            });
        }
        if requested > balance {
            return Err(CheckoutError::InsufficientPoints { balance });
        }
        if requested > payable {
            return Err(CheckoutError::PointsExceedPayable { payable });
        }
        Ok(requested)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn won(amount: i64) -> Decimal {
        Decimal::from(amount)
    }

    fn line(id: i32, price: i64, quantity: i32) -> CheckoutLine {
        CheckoutLine {
            product_id: ProductId::new(id),
            unit_price: won(price),
            quantity,
        }
    }

    fn coupon(kind: DiscountKind, value: i64) -> CouponTerms {
        CouponTerms {
            kind,
            value: won(value),
            max_discount: None,
            min_order_amount: Decimal::ZERO,
            starts_at: Utc::now() - Duration::days(1),
            ends_at: Some(Utc::now() + Duration::days(1)),
        }
    }

    fn quote(
        lines: &[CheckoutLine],
        coupon: Option<&CouponTerms>,
        points: i64,
        balance: i64,
        member_type: Option<MemberType>,
    ) -> Result<CheckoutQuote, CheckoutError> {
        CheckoutPolicy::default().quote(
            lines,
            coupon,
            won(points),
            won(balance),
            member_type,
            Utc::now(),
        )
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(
            quote(&[], None, 0, 0, None),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_invalid_quantity() {
        assert_eq!(
            quote(&[line(4, 1_000, 0)], None, 0, 0, None),
            Err(CheckoutError::InvalidQuantity(ProductId::new(4)))
        );
        assert!(quote(&[line(4, 1_000, 100)], None, 0, 0, None).is_err());
    }

    #[test]
    fn test_shipping_below_threshold() {
        let q = quote(&[line(1, 20_000, 2)], None, 0, 0, None).unwrap();
        assert_eq!(q.subtotal, won(40_000));
        assert_eq!(q.shipping_fee, won(3_000));
        assert_eq!(q.total, won(43_000));
        assert_eq!(q.earned_points, Decimal::ZERO);
    }

    #[test]
    fn test_free_shipping_at_threshold() {
        let q = quote(&[line(1, 25_000, 2)], None, 0, 0, None).unwrap();
        assert_eq!(q.shipping_fee, Decimal::ZERO);
        assert_eq!(q.total, won(50_000));
    }

    #[test]
    fn test_shipping_uses_subtotal_before_discount() {
        let terms = coupon(DiscountKind::Fixed, 10_000);
        let q = quote(&[line(1, 60_000, 1)], Some(&terms), 0, 0, None).unwrap();
        assert_eq!(q.coupon_discount, won(10_000));
        assert_eq!(q.shipping_fee, Decimal::ZERO);
        assert_eq!(q.total, won(50_000));
    }

    #[test]
    fn test_percent_coupon_floors_and_caps() {
        let mut terms = coupon(DiscountKind::Percent, 15);
        let q = quote(&[line(1, 33_333, 1)], Some(&terms), 0, 0, None).unwrap();
        assert_eq!(q.coupon_discount, won(4_999));

        terms.max_discount = Some(won(3_000));
        let q = quote(&[line(1, 33_333, 1)], Some(&terms), 0, 0, None).unwrap();
        assert_eq!(q.coupon_discount, won(3_000));
    }

    #[test]
    fn test_fixed_coupon_never_exceeds_subtotal() {
        let terms = coupon(DiscountKind::Fixed, 10_000);
        let q = quote(&[line(1, 4_000, 1)], Some(&terms), 0, 0, None).unwrap();
        assert_eq!(q.coupon_discount, won(4_000));
        assert_eq!(q.total, won(3_000));
    }

    #[test]
    fn test_coupon_minimum() {
        let mut terms = coupon(DiscountKind::Fixed, 5_000);
        terms.min_order_amount = won(30_000);
        assert_eq!(
            quote(&[line(1, 29_999, 1)], Some(&terms), 0, 0, None),
            Err(CheckoutError::CouponMinimumNotMet {
                minimum: won(30_000)
            })
        );
        assert_eq!(
            CheckoutError::CouponMinimumNotMet { minimum: won(30_000) }.to_string(),
            "coupon requires an order of at least ₩30,000"
        );
    }

    #[test]
    fn test_coupon_window() {
        let mut terms = coupon(DiscountKind::Fixed, 1_000);
        terms.ends_at = Some(Utc::now() - Duration::hours(1));
        assert_eq!(
            quote(&[line(1, 10_000, 1)], Some(&terms), 0, 0, None),
            Err(CheckoutError::CouponExpired)
        );

        let mut terms = coupon(DiscountKind::Fixed, 1_000);
        terms.starts_at = Utc::now() + Duration::hours(1);
        assert_eq!(
            quote(&[line(1, 10_000, 1)], Some(&terms), 0, 0, None),
            Err(CheckoutError::CouponNotStarted)
        );
        assert!(!terms.is_active(Utc::now()));
    }

    #[test]
    fn test_points_rules() {
        let lines = [line(1, 10_000, 1)];
        assert_eq!(
            quote(&lines, None, 500, 5_000, None),
            Err(CheckoutError::PointsBelowMinimum { minimum: won(1_000) })
        );
        assert_eq!(
            quote(&lines, None, 3_000, 2_000, None),
            Err(CheckoutError::InsufficientPoints { balance: won(2_000) })
        );
        assert_eq!(
            quote(&lines, None, 12_000, 20_000, None),
            Err(CheckoutError::PointsExceedPayable { payable: won(10_000) })
        );
        assert_eq!(
            quote(&lines, None, -1_000, 20_000, None),
            Err(CheckoutError::NegativePoints)
        );
    }

    #[test]
    fn test_points_after_coupon() {
        let terms = coupon(DiscountKind::Fixed, 4_000);
        let lines = [line(1, 10_000, 1)];
        assert_eq!(
            quote(&lines, Some(&terms), 7_000, 20_000, None),
            Err(CheckoutError::PointsExceedPayable { payable: won(6_000) })
        );

        let q = quote(&lines, Some(&terms), 6_000, 20_000, None).unwrap();
        assert_eq!(q.points_used, won(6_000));
        assert_eq!(q.total, won(3_000));
    }

    #[test]
    fn test_full_arithmetic_for_individual() {
        let terms = coupon(DiscountKind::Percent, 10);
        let lines = [line(1, 32_000, 1), line(2, 9_500, 2)];
        let q = quote(
            &lines,
            Some(&terms),
            2_000,
            10_000,
            Some(MemberType::Individual),
        )
        .unwrap();

        assert_eq!(q.subtotal, won(51_000));
        assert_eq!(q.coupon_discount, won(5_100));
        assert_eq!(q.points_used, won(2_000));
        assert_eq!(q.shipping_fee, Decimal::ZERO);
        assert_eq!(q.total, won(43_900));
        assert_eq!(q.earned_points, won(439));
    }

    #[test]
    fn test_earn_rates_by_member_type() {
        let lines = [line(1, 45_550, 1)];
        let individual = quote(&lines, None, 0, 0, Some(MemberType::Individual)).unwrap();
        assert_eq!(individual.earned_points, won(455));

        for member_type in [MemberType::Headquarters, MemberType::Branch, MemberType::Admin] {
            let q = quote(&lines, None, 0, 0, Some(member_type)).unwrap();
            assert_eq!(q.earned_points, Decimal::ZERO);
        }
    }

    #[test]
    fn test_fully_covered_order_only_pays_shipping() {
        let lines = [line(1, 10_000, 1)];
        let q = quote(&lines, None, 10_000, 10_000, Some(MemberType::Individual)).unwrap();
        assert_eq!(q.total, won(3_000));
        assert_eq!(q.earned_points, Decimal::ZERO);
    }
}
