//! Status and classification enums shared by the storefront and admin.
//!
//! Each enum maps to a Postgres enum in the `shop` schema and serializes as
//! `snake_case`, matching the strings the browser applications switch on.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown enum value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Implements `as_str`, `Display` and `FromStr` from one variant table.
macro_rules! string_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire and database representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $label,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

// =============================================================================
// Members
// =============================================================================

/// Member role. Selects the visible price field and the reachable pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.member_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum MemberType {
    #[default]
    Individual,
    /// Corporate parent account.
    Headquarters,
    /// Corporate child account, attached to a headquarters.
    Branch,
    Admin,
}

string_enum!(MemberType, "member type", {
    Individual => "individual",
    Headquarters => "headquarters",
    Branch => "branch",
    Admin => "admin",
});

impl MemberType {
    /// Headquarters and branches buy at the business price.
    #[must_use]
    pub const fn is_corporate(self) -> bool {
        matches!(self, Self::Headquarters | Self::Branch)
    }

    /// Corporate accounts wait for approval before they can sign in.
    #[must_use]
    pub const fn requires_approval(self) -> bool {
        self.is_corporate()
    }
}

/// Account lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.member_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    #[default]
    Pending,
    Active,
    Rejected,
    Withdrawn,
}

string_enum!(MemberStatus, "member status", {
    Pending => "pending",
    Active => "active",
    Rejected => "rejected",
    Withdrawn => "withdrawn",
});

impl MemberStatus {
    #[must_use]
    pub const fn can_login(self) -> bool {
        matches!(self, Self::Active)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Product availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.product_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    OnSale,
    SoldOut,
    /// Not listed on the storefront at all.
    Hidden,
}

string_enum!(ProductStatus, "product status", {
    OnSale => "on_sale",
    SoldOut => "sold_out",
    Hidden => "hidden",
});

impl ProductStatus {
    #[must_use]
    pub const fn is_purchasable(self) -> bool {
        matches!(self, Self::OnSale)
    }

    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Order lifecycle.
///
/// ```text
/// pending_payment ─▶ paid ─▶ preparing ─▶ shipping ─▶ delivered
///        │            │          │           │            │
///        └────────────┴──────────┴─▶ cancelled            │
///                     └──────────┴───────────┴────────────┴─▶ refunded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    PendingPayment,
    Paid,
    Preparing,
    Shipping,
    Delivered,
    Cancelled,
    Refunded,
}

string_enum!(OrderStatus, "order status", {
    PendingPayment => "pending_payment",
    Paid => "paid",
    Preparing => "preparing",
    Shipping => "shipping",
    Delivered => "delivered",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

impl OrderStatus {
    /// Whether an order may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use OrderStatus::{
            Cancelled, Delivered, Paid, PendingPayment, Preparing, Refunded, Shipping,
        };
        matches!(
            (self, next),
            (PendingPayment, Paid)
                | (Paid, Preparing)
                | (Preparing, Shipping)
                | (Shipping, Delivered)
                | (PendingPayment | Paid | Preparing, Cancelled)
                | (Paid | Preparing | Shipping | Delivered, Refunded)
        )
    }

    /// Customers may cancel until the order is being prepared.
    #[must_use]
    pub const fn is_cancellable_by_customer(self) -> bool {
        matches!(self, Self::PendingPayment | Self::Paid)
    }

    /// No further transitions. Delivered orders can still be refunded.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Refunded)
    }

    /// Money has been captured and not returned.
    #[must_use]
    pub const fn is_paid(self) -> bool {
        matches!(
            self,
            Self::Paid | Self::Preparing | Self::Shipping | Self::Delivered
        )
    }

    /// Goods that have not been handed to the courier go back on the shelf
    /// when the order is reversed.
    #[must_use]
    pub const fn restocks_on_reversal(self) -> bool {
        matches!(self, Self::Paid | Self::Preparing)
    }

    /// Placed but not yet delivered or closed.
    #[must_use]
    pub const fn is_in_progress(self) -> bool {
        matches!(
            self,
            Self::PendingPayment | Self::Paid | Self::Preparing | Self::Shipping
        )
    }
}

// =============================================================================
// Support
// =============================================================================

/// Support ticket kind.
///
/// Refund and exchange requests are ordinary inquiries whose title carries a
/// conventional prefix, so older clients that only read the title still see
/// the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.inquiry_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum InquiryKind {
    #[default]
    General,
    Refund,
    Exchange,
}

string_enum!(InquiryKind, "inquiry kind", {
    General => "general",
    Refund => "refund",
    Exchange => "exchange",
});

impl InquiryKind {
    /// Title prefix for this kind, empty for general inquiries.
    #[must_use]
    pub const fn title_prefix(self) -> &'static str {
        match self {
            Self::General => "",
            Self::Refund => "[Refund] ",
            Self::Exchange => "[Exchange] ",
        }
    }

    /// Recover the kind from a title written with [`Self::with_prefix`].
    #[must_use]
    pub fn classify(title: &str) -> Self {
        let title = title.trim_start();
        [Self::Refund, Self::Exchange]
            .into_iter()
            .find(|kind| title.starts_with(kind.title_prefix().trim_end()))
            .unwrap_or(Self::General)
    }

    /// Prefix `title` for this kind. Any existing kind prefix is replaced.
    #[must_use]
    pub fn with_prefix(self, title: &str) -> String {
        let bare = strip_prefix(title);
        format!("{}{bare}", self.title_prefix())
    }

    /// Requests that need an order reference.
    #[must_use]
    pub const fn requires_order(self) -> bool {
        matches!(self, Self::Refund | Self::Exchange)
    }
}

/// Remove a kind prefix from a title, if present.
#[must_use]
pub fn strip_prefix(title: &str) -> &str {
    let trimmed = title.trim_start();
    [InquiryKind::Refund, InquiryKind::Exchange]
        .into_iter()
        .find_map(|kind| trimmed.strip_prefix(kind.title_prefix().trim_end()))
        .map_or(trimmed, str::trim_start)
}

/// Support ticket lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.inquiry_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    #[default]
    Open,
    Answered,
    Closed,
}

string_enum!(InquiryStatus, "inquiry status", {
    Open => "open",
    Answered => "answered",
    Closed => "closed",
});

/// Board a notice is posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.notice_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    #[default]
    Notice,
    Faq,
}

string_enum!(NoticeKind, "notice kind", {
    Notice => "notice",
    Faq => "faq",
});

// =============================================================================
// Coupons
// =============================================================================

/// How a coupon's value is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.discount_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Value is a won amount.
    Fixed,
    /// Value is a percentage of the subtotal.
    Percent,
}

string_enum!(DiscountKind, "discount kind", {
    Fixed => "fixed",
    Percent => "percent",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_member_type_roundtrip() {
        for ty in MemberType::ALL {
            assert_eq!(ty.as_str().parse::<MemberType>().unwrap(), *ty);
        }
        assert!("vip".parse::<MemberType>().is_err());
    }

    #[test]
    fn test_member_type_corporate() {
        assert!(!MemberType::Individual.is_corporate());
        assert!(MemberType::Headquarters.is_corporate());
        assert!(MemberType::Branch.is_corporate());
        assert!(!MemberType::Admin.is_corporate());
    }

    #[test]
    fn test_member_status_login() {
        assert!(MemberStatus::Active.can_login());
        assert!(!MemberStatus::Pending.can_login());
        assert!(!MemberStatus::Rejected.can_login());
        assert!(!MemberStatus::Withdrawn.can_login());
    }

    #[test]
    fn test_product_status() {
        assert!(ProductStatus::OnSale.is_purchasable());
        assert!(!ProductStatus::SoldOut.is_purchasable());
        assert!(ProductStatus::SoldOut.is_visible());
        assert!(!ProductStatus::Hidden.is_visible());
    }

    #[test]
    fn test_order_forward_transitions() {
        use OrderStatus::*;
        assert!(PendingPayment.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(Shipping));
        assert!(Shipping.can_transition_to(Delivered));

        assert!(!PendingPayment.can_transition_to(Shipping));
        assert!(!Delivered.can_transition_to(Shipping));
        assert!(!Paid.can_transition_to(Paid));
    }

    #[test]
    fn test_order_cancel_and_refund_transitions() {
        use OrderStatus::*;
        for from in [PendingPayment, Paid, Preparing] {
            assert!(from.can_transition_to(Cancelled), "{from} -> cancelled");
        }
        assert!(!Shipping.can_transition_to(Cancelled));

        for from in [Paid, Preparing, Shipping, Delivered] {
            assert!(from.can_transition_to(Refunded), "{from} -> refunded");
        }
        assert!(!PendingPayment.can_transition_to(Refunded));
        assert!(!Cancelled.can_transition_to(Refunded));
        assert!(!Refunded.can_transition_to(Cancelled));
    }

    #[test]
    fn test_order_customer_cancellation() {
        use OrderStatus::*;
        assert!(PendingPayment.is_cancellable_by_customer());
        assert!(Paid.is_cancellable_by_customer());
        assert!(!Preparing.is_cancellable_by_customer());
        assert!(!Shipping.is_cancellable_by_customer());
    }

    #[test]
    fn test_order_restock_only_before_shipping() {
        use OrderStatus::*;
        assert!(Paid.restocks_on_reversal());
        assert!(Preparing.restocks_on_reversal());
        assert!(!Shipping.restocks_on_reversal());
        assert!(!Delivered.restocks_on_reversal());
    }

    #[test]
    fn test_order_terminal() {
        use OrderStatus::*;
        assert!(Cancelled.is_terminal());
        assert!(Refunded.is_terminal());
        assert!(!Delivered.is_terminal());
        assert!(!Paid.is_terminal());
    }

    #[test]
    fn test_inquiry_prefix() {
        assert_eq!(
            InquiryKind::Refund.with_prefix("Broken filter"),
            "[Refund] Broken filter"
        );
        assert_eq!(
            InquiryKind::Exchange.with_prefix("Wrong size"),
            "[Exchange] Wrong size"
        );
        assert_eq!(InquiryKind::General.with_prefix("Hello"), "Hello");
    }

    #[test]
    fn test_inquiry_prefix_is_not_doubled() {
        let once = InquiryKind::Refund.with_prefix("Leaking housing");
        assert_eq!(InquiryKind::Refund.with_prefix(&once), once);

        let switched = InquiryKind::Exchange.with_prefix(&once);
        assert_eq!(switched, "[Exchange] Leaking housing");
    }

    #[test]
    fn test_inquiry_classify() {
        assert_eq!(
            InquiryKind::classify("[Refund] Broken filter"),
            InquiryKind::Refund
        );
        assert_eq!(
            InquiryKind::classify("[Exchange]Wrong size"),
            InquiryKind::Exchange
        );
        assert_eq!(
            InquiryKind::classify("Refund please"),
            InquiryKind::General
        );
        assert_eq!(InquiryKind::classify(""), InquiryKind::General);
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("[Refund]  Broken"), "Broken");
        assert_eq!(strip_prefix("Plain title"), "Plain title");
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::PendingPayment).unwrap(),
            "\"pending_payment\""
        );
        assert_eq!(
            serde_json::from_str::<ProductStatus>("\"sold_out\"").unwrap(),
            ProductStatus::SoldOut
        );
        assert_eq!(
            serde_json::to_string(&MemberType::Headquarters).unwrap(),
            "\"headquarters\""
        );
    }
}
