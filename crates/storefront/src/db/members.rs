//! Member repository.
//!
//! Queries use runtime-checked `query_as` with the shared `FromRow` records
//! from `purewell-core`, so the crate builds without a live database.

use purewell_core::models::{Member, PointTransaction};
use purewell_core::{Email, MemberId, MemberStatus, MemberType, PageRequest};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::{RepositoryError, conflict_on_unique};

const MEMBER_SELECT: &str = "SELECT id, email, name, phone, member_type, status, points, \
     business_name, business_number, representative, headquarters_id, created_at, updated_at \
     FROM shop.member";

/// A member row together with its password hash.
#[derive(sqlx::FromRow)]
struct MemberWithHash {
    #[sqlx(flatten)]
    member: Member,
    password_hash: String,
}

/// Fields for a new member row.
#[derive(Debug)]
pub struct NewMember<'a> {
    pub email: &'a Email,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub phone: &'a str,
    pub member_type: MemberType,
    pub status: MemberStatus,
    pub business_name: Option<&'a str>,
    pub business_number: Option<&'a str>,
    pub representative: Option<&'a str>,
    pub headquarters_id: Option<MemberId>,
}

/// Repository for member database operations.
pub struct MemberRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MemberRepository<'a> {
    /// Create a new member repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current status and type, for re-checking signed-in sessions.
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
    pub async fn get_by_id(&self, id: MemberId) -> Result<Option<Member>, RepositoryError> {
        let member = sqlx::query_as::<_, Member>(&format!("{MEMBER_SELECT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(member)
    }

    /// Get a member and password hash by email, for sign-in.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Member, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, MemberWithHash>(
            "SELECT id, email, name, phone, member_type, status, points, business_name, \
             business_number, representative, headquarters_id, created_at, updated_at, \
             password_hash \
             FROM shop.member WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.member, r.password_hash)))
    }

    /// Get the password hash for a member.
    pub async fn get_password_hash(&self, id: MemberId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM shop.member WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(hash)
    }

    /// Find the active headquarters registered under a business number.
    pub async fn find_active_headquarters(
        &self,
        business_number: &str,
    ) -> Result<Option<Member>, RepositoryError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "{MEMBER_SELECT} WHERE business_number = $1 \
             AND member_type = 'headquarters' AND status = 'active'"
        ))
        .bind(business_number)
        .fetch_optional(self.pool)
        .await?;
        Ok(member)
    }

    /// Create a member.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email, or the business
    /// number of a headquarters, is already registered.
    pub async fn create(&self, new: &NewMember<'_>) -> Result<Member, RepositoryError> {
        let member = sqlx::query_as::<_, Member>(
            "INSERT INTO shop.member (email, password_hash, name, phone, member_type, status, \
             business_name, business_number, representative, headquarters_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING id, email, name, phone, member_type, status, points, business_name, \
             business_number, representative, headquarters_id, created_at, updated_at",
        )
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.name)
        .bind(new.phone)
        .bind(new.member_type)
        .bind(new.status)
        .bind(new.business_name)
        .bind(new.business_number)
        .bind(new.representative)
        .bind(new.headquarters_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email or business number already registered"))?;

        Ok(member)
    }

    /// Update name and phone.
    pub async fn update_profile(
        &self,
        id: MemberId,
        name: &str,
        phone: &str,
    ) -> Result<Member, RepositoryError> {
        sqlx::query_as::<_, Member>(
            "UPDATE shop.member SET name = $2, phone = $3, updated_at = now() WHERE id = $1 \
             RETURNING id, email, name, phone, member_type, status, points, business_name, \
             business_number, representative, headquarters_id, created_at, updated_at",
        )
        .bind(id)
        .bind(name)
        .bind(phone)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Replace the password hash.
    pub async fn update_password_hash(
        &self,
        id: MemberId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.member SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Mark a member as withdrawn.
    ///
    /// The email is replaced with a unique placeholder so the address can be
    /// registered again. The cart is dropped; orders and inquiries are kept.
    pub async fn withdraw(&self, id: MemberId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE shop.member \
             SET status = 'withdrawn', email = 'withdrawn-' || id || '@withdrawn.invalid', \
                 updated_at = now() \
             WHERE id = $1 AND status <> 'withdrawn'",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM shop.cart_item WHERE member_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Corporate
    // =========================================================================

    /// List branches of a headquarters, pending first.
    pub async fn list_branches(&self, headquarters_id: MemberId) -> Result<Vec<Member>, RepositoryError> {
        let branches = sqlx::query_as::<_, Member>(&format!(
            "{MEMBER_SELECT} WHERE headquarters_id = $1 AND member_type = 'branch' \
             ORDER BY (status = 'pending') DESC, created_at DESC"
        ))
        .bind(headquarters_id)
        .fetch_all(self.pool)
        .await?;
        Ok(branches)
    }

    /// Move a pending branch of `headquarters_id` to `status`.
    ///
    /// Returns `None` when the branch does not exist, belongs to another
    /// headquarters, or is no longer pending.
    pub async fn decide_branch(
        &self,
        headquarters_id: MemberId,
        branch_id: MemberId,
        status: MemberStatus,
    ) -> Result<Option<Member>, RepositoryError> {
        let member = sqlx::query_as::<_, Member>(
            "UPDATE shop.member SET status = $3, updated_at = now() \
             WHERE id = $2 AND headquarters_id = $1 AND member_type = 'branch' \
               AND status = 'pending' \
             RETURNING id, email, name, phone, member_type, status, points, business_name, \
             business_number, representative, headquarters_id, created_at, updated_at",
        )
        .bind(headquarters_id)
        .bind(branch_id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;
        Ok(member)
    }

    // =========================================================================
    // Points
    // =========================================================================

    /// Current point balance.
    pub async fn points_balance(&self, id: MemberId) -> Result<Decimal, RepositoryError> {
        sqlx::query_scalar::<_, Decimal>("SELECT points FROM shop.member WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Point ledger, newest first.
    pub async fn list_point_transactions(
        &self,
        id: MemberId,
        page: PageRequest,
    ) -> Result<(Vec<PointTransaction>, i64), RepositoryError> {
        let items = sqlx::query_as::<_, PointTransaction>(
            "SELECT id, member_id, delta, reason, order_id, created_at \
             FROM shop.point_transaction WHERE member_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM shop.point_transaction WHERE member_id = $1",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok((items, total))
    }
}
