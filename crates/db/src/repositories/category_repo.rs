//! Repository for the `categories` table.

use catalog_core::filter::ListQuery;
use catalog_core::types::DbId;
use sqlx::PgPool;

use crate::models::category::{Category, CategoryFilter, CategoryInput};
use crate::repositories::{existing_ids, like_pattern, page_window, trashed_clause};

/// Column list for the `categories` table.
const COLUMNS: &str = "id, name, description, is_active, created_at, updated_at, deleted_at";

/// Column list qualified with the `c` alias (used in JOIN queries).
pub(crate) const QUALIFIED_COLUMNS: &str = "c.id, c.name, c.description, c.is_active, \
    c.created_at, c.updated_at, c.deleted_at";

/// Default ordering when the client does not pick a sort column.
const DEFAULT_ORDER: &str = "c.created_at DESC, c.id";

/// Provides CRUD operations for categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Filter predicate shared by [`list`](Self::list) and [`count`](Self::count).
    ///
    /// Binds: `$1` search pattern, `$2` is_active.
    fn where_clause(query: &ListQuery) -> String {
        format!(
            "{trashed} \
             AND ($1::text IS NULL OR c.name ILIKE $1) \
             AND ($2::bool IS NULL OR c.is_active = $2)",
            trashed = trashed_clause(query.trashed, "c"),
        )
    }

    /// One page (or, with `all`, every row) of categories.
    pub async fn list(
        pool: &PgPool,
        query: &ListQuery,
        filter: &CategoryFilter,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let (limit, offset) = page_window(query);
        let sql = format!(
            "SELECT {QUALIFIED_COLUMNS} FROM categories c \
             WHERE {where_clause} \
             ORDER BY {order} \
             LIMIT $3 OFFSET $4",
            where_clause = Self::where_clause(query),
            order = query.order_by("c", DEFAULT_ORDER),
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(like_pattern(query.search.as_deref()))
            .bind(filter.is_active)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Total rows matching the list filters, ignoring pagination.
    pub async fn count(
        pool: &PgPool,
        query: &ListQuery,
        filter: &CategoryFilter,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!(
            "SELECT COUNT(*) FROM categories c WHERE {}",
            Self::where_clause(query)
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(like_pattern(query.search.as_deref()))
            .bind(filter.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a live category by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a category by ID, including soft-deleted rows.
    pub async fn find_by_id_with_trashed(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new category. `is_active` defaults to `true`.
    pub async fn create(pool: &PgPool, input: &CategoryInput) -> Result<Category, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories (name, description, is_active) \
             VALUES ($1, $2, COALESCE($3, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(&input.name)
            .bind(input.description.clone().flatten())
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Update a live category. Returns `None` if no such row exists.
    ///
    /// An absent `description` is left as is; an explicit `null` clears it.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &CategoryInput,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!(
            "UPDATE categories SET \
                name = COALESCE($2, name), \
                description = CASE WHEN $3 THEN $4 ELSE description END, \
                is_active = COALESCE($5, is_active) \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.description.is_some())
            .bind(input.description.clone().flatten())
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a category. Returns `true` if a live row was deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE categories SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Restore a soft-deleted category. Returns `None` if nothing was restored.
    pub async fn restore(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!(
            "UPDATE categories SET deleted_at = NULL \
             WHERE id = $1 AND deleted_at IS NOT NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a category, trashed or not. Returns the removed row.
    pub async fn hard_delete(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("DELETE FROM categories WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Which of `ids` are live categories.
    pub async fn existing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        existing_ids(pool, "categories", ids).await
    }
}
