//! Notices and FAQ entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{NoticeId, NoticeKind};

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Notice {
    pub id: NoticeId,
    pub kind: NoticeKind,
    pub title: String,
    pub body: String,
    /// Pinned entries list before everything else.
    pub pinned: bool,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
