//! Repository for the `cast_members` table.

use catalog_core::filter::ListQuery;
use catalog_core::types::DbId;
use sqlx::PgPool;

use crate::models::cast_member::{CastMember, CastMemberFilter, CastMemberInput};
use crate::repositories::{existing_ids, like_pattern, page_window, trashed_clause};

/// Column list for the `cast_members` table.
const COLUMNS: &str = "id, name, type, created_at, updated_at, deleted_at";

/// Column list qualified with the `m` alias (used in JOIN queries).
pub(crate) const QUALIFIED_COLUMNS: &str =
    "m.id, m.name, m.type, m.created_at, m.updated_at, m.deleted_at";

const DEFAULT_ORDER: &str = "m.created_at DESC, m.id";

/// Provides CRUD operations for cast members.
pub struct CastMemberRepo;

impl CastMemberRepo {
    /// Binds: `$1` search pattern, `$2` type.
    fn where_clause(query: &ListQuery) -> String {
        format!(
            "{trashed} \
             AND ($1::text IS NULL OR m.name ILIKE $1) \
             AND ($2::smallint IS NULL OR m.type = $2)",
            trashed = trashed_clause(query.trashed, "m"),
        )
    }

    pub async fn list(
        pool: &PgPool,
        query: &ListQuery,
        filter: &CastMemberFilter,
    ) -> Result<Vec<CastMember>, sqlx::Error> {
        let (limit, offset) = page_window(query);
        let sql = format!(
            "SELECT {QUALIFIED_COLUMNS} FROM cast_members m \
             WHERE {where_clause} \
             ORDER BY {order} \
             LIMIT $3 OFFSET $4",
            where_clause = Self::where_clause(query),
            order = query.order_by("m", DEFAULT_ORDER),
        );
        sqlx::query_as::<_, CastMember>(&sql)
            .bind(like_pattern(query.search.as_deref()))
            .bind(filter.member_type.map(|t| t.as_i16()))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(
        pool: &PgPool,
        query: &ListQuery,
        filter: &CastMemberFilter,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!(
            "SELECT COUNT(*) FROM cast_members m WHERE {}",
            Self::where_clause(query)
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(like_pattern(query.search.as_deref()))
            .bind(filter.member_type.map(|t| t.as_i16()))
            .fetch_one(pool)
            .await
    }

    /// Find a live cast member by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<CastMember>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM cast_members WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, CastMember>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a cast member by ID, including soft-deleted rows.
    pub async fn find_by_id_with_trashed(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<CastMember>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cast_members WHERE id = $1");
        sqlx::query_as::<_, CastMember>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &PgPool,
        input: &CastMemberInput,
    ) -> Result<CastMember, sqlx::Error> {
        let query = format!(
            "INSERT INTO cast_members (name, type) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CastMember>(&query)
            .bind(&input.name)
            .bind(input.member_type.map(|t| t.as_i16()))
            .fetch_one(pool)
            .await
    }

    /// Update a live cast member. Returns `None` if no such row exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &CastMemberInput,
    ) -> Result<Option<CastMember>, sqlx::Error> {
        let query = format!(
            "UPDATE cast_members SET \
                name = COALESCE($2, name), \
                type = COALESCE($3, type) \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CastMember>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.member_type.map(|t| t.as_i16()))
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a cast member. Returns `true` if a live row was deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cast_members SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn restore(pool: &PgPool, id: DbId) -> Result<Option<CastMember>, sqlx::Error> {
        let query = format!(
            "UPDATE cast_members SET deleted_at = NULL \
             WHERE id = $1 AND deleted_at IS NOT NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CastMember>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a cast member. Returns the removed row.
    pub async fn hard_delete(pool: &PgPool, id: DbId) -> Result<Option<CastMember>, sqlx::Error> {
        let query = format!("DELETE FROM cast_members WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, CastMember>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Which of `ids` are live cast members.
    pub async fn existing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        existing_ids(pool, "cast_members", ids).await
    }
}
