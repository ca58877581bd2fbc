//! Role-based price field selection.
//!
//! Products carry two static prices. Which one a viewer sees, and which one
//! they are charged, depends only on their member type.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::MemberType;

/// The prices a viewer is shown for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PriceView {
    /// Guests and individual members.
    Customer { price: Decimal },
    /// Headquarters and branches see the business price with the customer
    /// price as a struck-through reference.
    Business { price: Decimal, list_price: Decimal },
    /// Admins see both fields.
    Admin {
        customer_price: Decimal,
        business_price: Decimal,
    },
}

impl PriceView {
    /// Select the view for `viewer` (`None` for guests).
    ///
    /// ```
    /// use purewell_core::{MemberType, PriceView};
    /// use rust_decimal::Decimal;
    ///
    /// let view = PriceView::resolve(
    ///     Some(MemberType::Branch),
    ///     Decimal::from(120_000),
    ///     Decimal::from(96_000),
    /// );
    /// assert_eq!(view.charged(), Decimal::from(96_000));
    /// ```
    #[must_use]
    pub const fn resolve(
        viewer: Option<MemberType>,
        customer_price: Decimal,
        business_price: Decimal,
    ) -> Self {
        match viewer {
            None | Some(MemberType::Individual) => Self::Customer {
                price: customer_price,
            },
            Some(MemberType::Headquarters | MemberType::Branch) => Self::Business {
                price: business_price,
                list_price: customer_price,
            },
            Some(MemberType::Admin) => Self::Admin {
                customer_price,
                business_price,
            },
        }
    }

    /// Unit price charged when this viewer buys the product.
    #[must_use]
    pub const fn charged(&self) -> Decimal {
        match *self {
            Self::Customer { price } | Self::Business { price, .. } => price,
            Self::Admin { customer_price, .. } => customer_price,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn won(amount: i64) -> Decimal {
        Decimal::from(amount)
    }

    #[test]
    fn test_guest_and_individual_see_customer_price() {
        for viewer in [None, Some(MemberType::Individual)] {
            let view = PriceView::resolve(viewer, won(50_000), won(40_000));
            assert_eq!(view, PriceView::Customer { price: won(50_000) });
            assert_eq!(view.charged(), won(50_000));
        }
    }

    #[test]
    fn test_corporate_sees_business_price() {
        for viewer in [MemberType::Headquarters, MemberType::Branch] {
            let view = PriceView::resolve(Some(viewer), won(50_000), won(40_000));
            assert_eq!(
                view,
                PriceView::Business {
                    price: won(40_000),
                    list_price: won(50_000)
                }
            );
            assert_eq!(view.charged(), won(40_000));
        }
    }

    #[test]
    fn test_admin_sees_both_and_pays_customer_price() {
        let view = PriceView::resolve(Some(MemberType::Admin), won(50_000), won(40_000));
        assert_eq!(
            view,
            PriceView::Admin {
                customer_price: won(50_000),
                business_price: won(40_000)
            }
        );
        assert_eq!(view.charged(), won(50_000));
    }

    #[test]
    fn test_serialized_shape() {
        let view = PriceView::resolve(Some(MemberType::Branch), won(10_000), won(8_000));
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["view"], "business");
        assert_eq!(json["price"], "8000");
        assert_eq!(json["list_price"], "10000");
    }
}
