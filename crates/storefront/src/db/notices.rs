//! Notices and FAQ entries.

use purewell_core::models::Notice;
use purewell_core::{NoticeId, NoticeKind, PageRequest};
use sqlx::PgPool;

use super::RepositoryError;

const NOTICE_COLUMNS: &str = "id, kind, title, body, pinned, view_count, created_at, updated_at";

/// Repository for the public notice board.
pub struct NoticeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NoticeRepository<'a> {
    /// Create a new notice repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Notices of one kind, pinned first, then newest first.
    pub async fn list(
        &self,
        kind: NoticeKind,
        page: PageRequest,
    ) -> Result<(Vec<Notice>, i64), RepositoryError> {
        let notices = sqlx::query_as::<_, Notice>(&format!(
            "SELECT {NOTICE_COLUMNS} FROM shop.notice WHERE kind = $1 \
             ORDER BY pinned DESC, created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(kind)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shop.notice WHERE kind = $1")
            .bind(kind)
            .fetch_one(self.pool)
            .await?;

        Ok((notices, total))
    }

    /// Fetch a notice and count the view.
    pub async fn view(&self, id: NoticeId) -> Result<Option<Notice>, RepositoryError> {
        let notice = sqlx::query_as::<_, Notice>(&format!(
            "UPDATE shop.notice SET view_count = view_count + 1 WHERE id = $1 \
             RETURNING {NOTICE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(notice)
    }
}
