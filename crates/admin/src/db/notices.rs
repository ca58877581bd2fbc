//! Notice and FAQ board maintenance.

use purewell_core::models::Notice;
use purewell_core::{NoticeId, NoticeKind, PageRequest};
use serde::Deserialize;
use sqlx::PgPool;

use super::RepositoryError;

const NOTICE_COLUMNS: &str = "id, kind, title, body, pinned, view_count, created_at, updated_at";

/// Fields an admin writes.
#[derive(Debug, Clone, Deserialize)]
pub struct NoticeInput {
    #[serde(default)]
    pub kind: NoticeKind,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub pinned: bool,
}

/// Repository for notice maintenance.
pub struct NoticeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NoticeRepository<'a> {
    /// Create a new notice repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One board, pinned first, then newest.
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

    /// Get a notice without counting a view.
    pub async fn get(&self, id: NoticeId) -> Result<Option<Notice>, RepositoryError> {
        let notice = sqlx::query_as::<_, Notice>(&format!(
            "SELECT {NOTICE_COLUMNS} FROM shop.notice WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(notice)
    }

    pub async fn create(&self, input: &NoticeInput) -> Result<Notice, RepositoryError> {
        let notice = sqlx::query_as::<_, Notice>(&format!(
            "INSERT INTO shop.notice (kind, title, body, pinned) VALUES ($1, $2, $3, $4) \
             RETURNING {NOTICE_COLUMNS}"
        ))
        .bind(input.kind)
        .bind(&input.title)
        .bind(&input.body)
        .bind(input.pinned)
        .fetch_one(self.pool)
        .await?;
        Ok(notice)
    }

    pub async fn update(&self, id: NoticeId, input: &NoticeInput) -> Result<Notice, RepositoryError> {
        sqlx::query_as::<_, Notice>(&format!(
            "UPDATE shop.notice SET kind = $2, title = $3, body = $4, pinned = $5, \
             updated_at = now() WHERE id = $1 RETURNING {NOTICE_COLUMNS}"
        ))
        .bind(id)
        .bind(input.kind)
        .bind(&input.title)
        .bind(&input.body)
        .bind(input.pinned)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Pin or unpin.
    pub async fn set_pinned(&self, id: NoticeId, pinned: bool) -> Result<Notice, RepositoryError> {
        sqlx::query_as::<_, Notice>(&format!(
            "UPDATE shop.notice SET pinned = $2, updated_at = now() WHERE id = $1 \
             RETURNING {NOTICE_COLUMNS}"
        ))
        .bind(id)
        .bind(pinned)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    pub async fn delete(&self, id: NoticeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.notice WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
