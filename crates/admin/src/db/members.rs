//! Member administration: listing, approvals, status changes and point
//! adjustments.

use purewell_core::models::{Member, PointTransaction};
use purewell_core::{Email, MemberId, MemberStatus, MemberType, PageRequest};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use super::{RepositoryError, like_pattern};

const MEMBER_COLUMNS: &str = "id, email, name, phone, member_type, status, points, \
     business_name, business_number, representative, headquarters_id, created_at, updated_at";

/// Ledger reason for manual adjustments.
pub const POINTS_ADJUSTED: &str = "admin_adjustment";

/// Member list filters. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct MemberFilter {
    pub member_type: Option<MemberType>,
    pub status: Option<MemberStatus>,
    /// Matches email, name, phone or business name.
    pub q: Option<String>,
}

#[derive(sqlx::FromRow)]
struct AdminWithHash {
    #[sqlx(flatten)]
    member: Member,
    password_hash: String,
}

/// Repository for member administration.
pub struct MemberRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MemberRepository<'a> {
    /// Create a new member repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// An active admin account and its password hash.
    pub async fn get_admin_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Member, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminWithHash>(&format!(
            "SELECT {MEMBER_COLUMNS}, password_hash FROM shop.member \
             WHERE lower(email) = lower($1) AND member_type = 'admin' AND status = 'active'"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(|r| (r.member, r.password_hash)))
    }

    /// Members matching the filter, newest first.
    pub async fn list(
        &self,
        filter: &MemberFilter,
        page: PageRequest,
    ) -> Result<(Vec<Member>, i64), RepositoryError> {
        let pattern = filter.q.as_deref().filter(|q| !q.trim().is_empty()).map(like_pattern);
        let condition = "($1::shop.member_type IS NULL OR member_type = $1) \
             AND ($2::shop.member_status IS NULL OR status = $2) \
             AND ($3::text IS NULL OR email ILIKE $3 OR name ILIKE $3 OR phone ILIKE $3 \
                  OR business_name ILIKE $3)";

        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM shop.member WHERE {condition} \
             ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        ))
        .bind(filter.member_type)
        .bind(filter.status)
        .bind(pattern.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM shop.member WHERE {condition}"
        ))
        .bind(filter.member_type)
        .bind(filter.status)
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok((members, total))
    }

    /// Current status and type, for re-checking signed-in admins.
    pub async fn standing(
        &self,
        id: MemberId,
    ) -> Result<Option<(MemberStatus, MemberType)>, RepositoryError> {
        let standing = sqlx::query_as::<_, (MemberStatus, MemberType)>(
            "SELECT status, member_type FROM shop.member WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(standing)
    }

    /// Get a member by ID.
    pub async fn get(&self, id: MemberId) -> Result<Option<Member>, RepositoryError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM shop.member WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(member)
    }

    /// Branches registered under a headquarters.
    pub async fn branches_of(&self, headquarters_id: MemberId) -> Result<Vec<Member>, RepositoryError> {
        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM shop.member WHERE headquarters_id = $1 ORDER BY name, id"
        ))
        .bind(headquarters_id)
        .fetch_all(self.pool)
        .await?;
        Ok(members)
    }

    /// Approve or reject a pending corporate account.
    ///
    /// Returns `None` when the member is not a pending headquarters or branch.
    pub async fn decide(
        &self,
        id: MemberId,
        decision: MemberStatus,
    ) -> Result<Option<Member>, RepositoryError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "UPDATE shop.member SET status = $2, updated_at = now() \
             WHERE id = $1 AND status = 'pending' AND member_type IN ('headquarters', 'branch') \
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(id)
        .bind(decision)
        .fetch_optional(self.pool)
        .await?;
        Ok(member)
    }

    /// Set a member's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the member does not exist.
    pub async fn set_status(&self, id: MemberId, status: MemberStatus) -> Result<Member, RepositoryError> {
        sqlx::query_as::<_, Member>(&format!(
            "UPDATE shop.member SET status = $2, updated_at = now() WHERE id = $1 \
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Add `delta` (possibly negative) to a balance and record it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the balance would go negative.
    pub async fn adjust_points(
        &self,
        id: MemberId,
        delta: Decimal,
        reason: &str,
    ) -> Result<(Member, PointTransaction), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let balance = sqlx::query_scalar::<_, Decimal>(
            "SELECT points FROM shop.member WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if balance + delta < Decimal::ZERO {
            return Err(RepositoryError::Conflict(format!(
                "balance is {balance}; cannot subtract {}",
                -delta
            )));
        }

        let member = sqlx::query_as::<_, Member>(&format!(
            "UPDATE shop.member SET points = points + $2, updated_at = now() WHERE id = $1 \
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(id)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await?;

        let entry = sqlx::query_as::<_, PointTransaction>(
            "INSERT INTO shop.point_transaction (member_id, delta, reason) VALUES ($1, $2, $3) \
             RETURNING id, member_id, delta, reason, order_id, created_at",
        )
        .bind(id)
        .bind(delta)
        .bind(reason)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((member, entry))
    }

    /// Most recent ledger entries for a member.
    pub async fn recent_point_transactions(
        &self,
        id: MemberId,
        limit: i64,
    ) -> Result<Vec<PointTransaction>, RepositoryError> {
        let entries = sqlx::query_as::<_, PointTransaction>(
            "SELECT id, member_id, delta, reason, order_id, created_at \
             FROM shop.point_transaction WHERE member_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }
}
