//! Entity records shared by the storefront and admin APIs.
//!
//! These are the shapes rows take once loaded from the `shop` schema. With the
//! `postgres` feature enabled they derive `sqlx::FromRow` so repositories can
//! use them directly as query targets.

pub mod cart;
pub mod category;
pub mod coupon;
pub mod inquiry;
pub mod member;
pub mod notice;
pub mod order;
pub mod point;
pub mod product;

pub use cart::{CartItem, MAX_LINE_QUANTITY};
pub use category::{Category, CategoryNode, CategoryTree};
pub use coupon::{Coupon, IssuedCoupon, MemberCoupon};
pub use inquiry::Inquiry;
pub use member::Member;
pub use notice::Notice;
pub use order::{Order, OrderItem};
pub use point::PointTransaction;
pub use product::Product;
