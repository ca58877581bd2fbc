//! Back-office dashboard figures.

use purewell_core::models::Product;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use super::{ProductRepository, RepositoryError};

/// Low-stock products listed on the dashboard.
const LOW_STOCK_LIMIT: i64 = 20;

/// Figures shown on the dashboard. "Today" and "this month" are Korea time.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub today_order_count: i64,
    pub today_revenue: Decimal,
    pub month_revenue: Decimal,
    /// Paid or preparing orders waiting to ship.
    pub awaiting_shipment: i64,
    pub pending_corporate_members: i64,
    pub open_inquiries: i64,
    pub low_stock_threshold: i32,
    pub low_stock: Vec<Product>,
}

#[derive(sqlx::FromRow)]
struct Counts {
    today_order_count: i64,
    today_revenue: Decimal,
    month_revenue: Decimal,
    awaiting_shipment: i64,
    pending_corporate_members: i64,
    open_inquiries: i64,
}

/// Repository for dashboard aggregates.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    /// Create a new dashboard repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Revenue counts paid orders that have not been reversed.
    pub async fn summary(&self, low_stock_threshold: i32) -> Result<DashboardSummary, RepositoryError> {
        let counts = sqlx::query_as::<_, Counts>(
            "WITH bounds AS ( \
                 SELECT date_trunc('day', now() AT TIME ZONE 'Asia/Seoul') AT TIME ZONE 'Asia/Seoul' AS day_start, \
                        date_trunc('month', now() AT TIME ZONE 'Asia/Seoul') AT TIME ZONE 'Asia/Seoul' AS month_start \
             ) \
             SELECT \
                 (SELECT COUNT(*) FROM shop.order, bounds \
                     WHERE paid_at >= day_start \
                       AND status IN ('paid', 'preparing', 'shipping', 'delivered')) AS today_order_count, \
                 (SELECT COALESCE(SUM(total), 0) FROM shop.order, bounds \
                     WHERE paid_at >= day_start \
                       AND status IN ('paid', 'preparing', 'shipping', 'delivered')) AS today_revenue, \
                 (SELECT COALESCE(SUM(total), 0) FROM shop.order, bounds \
                     WHERE paid_at >= month_start \
                       AND status IN ('paid', 'preparing', 'shipping', 'delivered')) AS month_revenue, \
                 (SELECT COUNT(*) FROM shop.order WHERE status IN ('paid', 'preparing')) \
                     AS awaiting_shipment, \
                 (SELECT COUNT(*) FROM shop.member \
                     WHERE status = 'pending' AND member_type IN ('headquarters', 'branch')) \
                     AS pending_corporate_members, \
                 (SELECT COUNT(*) FROM shop.inquiry WHERE status = 'open') AS open_inquiries",
        )
        .fetch_one(self.pool)
        .await?;

        let low_stock = ProductRepository::new(self.pool)
            .low_stock(low_stock_threshold, LOW_STOCK_LIMIT)
            .await?;

        Ok(DashboardSummary {
            today_order_count: counts.today_order_count,
            today_revenue: counts.today_revenue,
            month_revenue: counts.month_revenue,
            awaiting_shipment: counts.awaiting_shipment,
            pending_corporate_members: counts.pending_corporate_members,
            open_inquiries: counts.open_inquiries,
            low_stock_threshold,
            low_stock,
        })
    }
}
