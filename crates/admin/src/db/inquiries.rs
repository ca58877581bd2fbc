//! Support inquiries as the back office sees them.

use purewell_core::models::Inquiry;
use purewell_core::{InquiryId, InquiryKind, InquiryStatus, PageRequest};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::RepositoryError;

const INQUIRY_COLUMNS: &str = "i.id, i.member_id, i.order_id, i.kind, i.title, i.body, i.status, \
     i.answer, i.answered_at, i.created_at, i.updated_at";

const INQUIRY_FROM: &str = "FROM shop.inquiry i \
     JOIN shop.member m ON m.id = i.member_id \
     LEFT JOIN shop.order o ON o.id = i.order_id";

/// Inquiry list filters.
#[derive(Debug, Default, Deserialize)]
pub struct InquiryFilter {
    pub kind: Option<InquiryKind>,
    pub status: Option<InquiryStatus>,
}

/// An inquiry with who asked and the order it refers to.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InquiryRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub inquiry: Inquiry,
    pub member_name: String,
    pub member_email: String,
    pub order_number: Option<String>,
}

/// Repository for inquiry handling.
pub struct InquiryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InquiryRepository<'a> {
    /// Create a new inquiry repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Inquiries matching the filter. Open ones first, then newest.
    pub async fn list(
        &self,
        filter: &InquiryFilter,
        page: PageRequest,
    ) -> Result<(Vec<InquiryRow>, i64), RepositoryError> {
        let condition = "($1::shop.inquiry_kind IS NULL OR i.kind = $1) \
             AND ($2::shop.inquiry_status IS NULL OR i.status = $2)";

        let inquiries = sqlx::query_as::<_, InquiryRow>(&format!(
            "SELECT {INQUIRY_COLUMNS}, m.name AS member_name, m.email AS member_email, \
                    o.order_number {INQUIRY_FROM} WHERE {condition} \
             ORDER BY (i.status = 'open') DESC, i.created_at DESC, i.id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(filter.kind)
        .bind(filter.status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM shop.inquiry i WHERE {condition}"
        ))
        .bind(filter.kind)
        .bind(filter.status)
        .fetch_one(self.pool)
        .await?;

        Ok((inquiries, total))
    }

    /// Get an inquiry by ID.
    pub async fn get(&self, id: InquiryId) -> Result<Option<InquiryRow>, RepositoryError> {
        let inquiry = sqlx::query_as::<_, InquiryRow>(&format!(
            "SELECT {INQUIRY_COLUMNS}, m.name AS member_name, m.email AS member_email, \
                    o.order_number {INQUIRY_FROM} WHERE i.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(inquiry)
    }

    /// Record an answer. Answering again replaces the previous answer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a closed inquiry.
    pub async fn answer(&self, id: InquiryId, answer: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.inquiry SET answer = $2, status = 'answered', answered_at = now(), \
             updated_at = now() WHERE id = $1 AND status <> 'closed'",
        )
        .bind(id)
        .bind(answer)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_closed(id).await);
        }
        Ok(())
    }

    /// Close an inquiry.
    pub async fn close(&self, id: InquiryId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.inquiry SET status = 'closed', updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn missing_or_closed(&self, id: InquiryId) -> RepositoryError {
        match sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM shop.inquiry WHERE id = $1)")
            .bind(id)
            .fetch_one(self.pool)
            .await
        {
            Ok(true) => RepositoryError::Conflict("inquiry is closed".to_string()),
            Ok(false) => RepositoryError::NotFound,
            Err(e) => RepositoryError::Database(e),
        }
    }
}
