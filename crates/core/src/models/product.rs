//! Catalog products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::pricing::PriceView;
use crate::types::{CategoryId, MemberType, ProductId, ProductStatus};

/// A catalog product with both static price fields.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub model_code: String,
    pub summary: String,
    pub description: String,
    /// Price shown to individuals and guests.
    pub customer_price: Decimal,
    /// Price shown to headquarters and branch accounts.
    pub business_price: Decimal,
    pub stock: i32,
    pub status: ProductStatus,
    pub image_url: Option<String>,
    /// Recommended cartridge replacement interval.
    pub replacement_cycle_months: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Prices as seen by `viewer`.
    #[must_use]
    pub const fn price_for(&self, viewer: Option<MemberType>) -> PriceView {
        PriceView::resolve(viewer, self.customer_price, self.business_price)
    }

    /// On sale with at least `quantity` units in stock.
    #[must_use]
    pub const fn can_fulfil(&self, quantity: i32) -> bool {
        self.status.is_purchasable() && quantity > 0 && self.stock >= quantity
    }
}
