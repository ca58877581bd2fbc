//! Support inquiries, including refund and exchange requests.

use purewell_core::models::Inquiry;
use purewell_core::{InquiryId, InquiryKind, MemberId, OrderId, PageRequest};
use sqlx::PgPool;

use super::RepositoryError;

const INQUIRY_COLUMNS: &str = "id, member_id, order_id, kind, title, body, status, answer, \
     answered_at, created_at, updated_at";

/// Repository for a member's inquiries.
pub struct InquiryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InquiryRepository<'a> {
    /// Create a new inquiry repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A member's inquiries, newest first.
    pub async fn list(
        &self,
        member_id: MemberId,
        page: PageRequest,
    ) -> Result<(Vec<Inquiry>, i64), RepositoryError> {
        let inquiries = sqlx::query_as::<_, Inquiry>(&format!(
            "SELECT {INQUIRY_COLUMNS} FROM shop.inquiry WHERE member_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(member_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM shop.inquiry WHERE member_id = $1",
        )
        .bind(member_id)
        .fetch_one(self.pool)
        .await?;

        Ok((inquiries, total))
    }

    /// One of the member's inquiries.
    pub async fn get(
        &self,
        member_id: MemberId,
        id: InquiryId,
    ) -> Result<Option<Inquiry>, RepositoryError> {
        let inquiry = sqlx::query_as::<_, Inquiry>(&format!(
            "SELECT {INQUIRY_COLUMNS} FROM shop.inquiry WHERE id = $1 AND member_id = $2"
        ))
        .bind(id)
        .bind(member_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(inquiry)
    }

    /// Create an inquiry. `title` must already carry the kind prefix.
    pub async fn create(
        &self,
        member_id: MemberId,
        kind: InquiryKind,
        order_id: Option<OrderId>,
        title: &str,
        body: &str,
    ) -> Result<Inquiry, RepositoryError> {
        let inquiry = sqlx::query_as::<_, Inquiry>(&format!(
            "INSERT INTO shop.inquiry (member_id, kind, order_id, title, body) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {INQUIRY_COLUMNS}"
        ))
        .bind(member_id)
        .bind(kind)
        .bind(order_id)
        .bind(title)
        .bind(body)
        .fetch_one(self.pool)
        .await?;
        Ok(inquiry)
    }

    /// Delete an inquiry that has not been answered.
    ///
    /// Returns `false` when no open inquiry with that id belongs to the member.
    pub async fn delete_open(&self, member_id: MemberId, id: InquiryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM shop.inquiry WHERE id = $1 AND member_id = $2 AND status = 'open'",
        )
        .bind(id)
        .bind(member_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
