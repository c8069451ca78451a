//! Repository for the `genres` table and its `category_genre` associations.

use std::collections::HashMap;

use catalog_core::filter::ListQuery;
use catalog_core::types::DbId;
use sqlx::{FromRow, PgPool};

use crate::models::category::Category;
use crate::models::genre::{Genre, GenreFilter, GenreInput, GenreWithCategories};
use crate::repositories::category_repo::QUALIFIED_COLUMNS as CATEGORY_COLUMNS;
use crate::repositories::{
    existing_ids, like_pattern, page_window, sync_pivot, trashed_clause, PgTransaction, Pivot,
    RelationChange,
};

/// Column list for the `genres` table.
const COLUMNS: &str = "id, name, is_active, created_at, updated_at, deleted_at";

/// Column list qualified with the `g` alias (used in JOIN queries).
pub(crate) const QUALIFIED_COLUMNS: &str =
    "g.id, g.name, g.is_active, g.created_at, g.updated_at, g.deleted_at";

const DEFAULT_ORDER: &str = "g.created_at DESC, g.id";

/// A category tagged with the genre it was loaded for.
#[derive(FromRow)]
struct GenreCategoryRow {
    genre_id: DbId,
    #[sqlx(flatten)]
    category: Category,
}

const CATEGORY_PIVOT: Pivot = Pivot {
    relation: "genre_categories",
    table: "category_genre",
    owner_column: "genre_id",
    related_column: "category_id",
};

/// Provides CRUD operations for genres and their category associations.
pub struct GenreRepo;

impl GenreRepo {
    /// Binds: `$1` search pattern, `$2` is_active, `$3` category ids/names.
    fn where_clause(query: &ListQuery) -> String {
        format!(
            "{trashed} \
             AND ($1::text IS NULL OR g.name ILIKE $1) \
             AND ($2::bool IS NULL OR g.is_active = $2) \
             AND (cardinality($3::text[]) = 0 OR EXISTS ( \
                 SELECT 1 FROM category_genre cg \
                 JOIN categories c ON c.id = cg.category_id \
                 WHERE cg.genre_id = g.id \
                   AND (c.id::text = ANY($3) OR c.name = ANY($3))))",
            trashed = trashed_clause(query.trashed, "g"),
        )
    }

    pub async fn list(
        pool: &PgPool,
        query: &ListQuery,
        filter: &GenreFilter,
    ) -> Result<Vec<Genre>, sqlx::Error> {
        let (limit, offset) = page_window(query);
        let sql = format!(
            "SELECT {QUALIFIED_COLUMNS} FROM genres g \
             WHERE {where_clause} \
             ORDER BY {order} \
             LIMIT $4 OFFSET $5",
            where_clause = Self::where_clause(query),
            order = query.order_by("g", DEFAULT_ORDER),
        );
        sqlx::query_as::<_, Genre>(&sql)
            .bind(like_pattern(query.search.as_deref()))
            .bind(filter.is_active)
            .bind(&filter.categories)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(
        pool: &PgPool,
        query: &ListQuery,
        filter: &GenreFilter,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!(
            "SELECT COUNT(*) FROM genres g WHERE {}",
            Self::where_clause(query)
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(like_pattern(query.search.as_deref()))
            .bind(filter.is_active)
            .bind(&filter.categories)
            .fetch_one(pool)
            .await
    }

    /// Find a live genre by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Genre>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM genres WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Genre>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a genre by ID, including soft-deleted rows.
    pub async fn find_by_id_with_trashed(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Genre>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM genres WHERE id = $1");
        sqlx::query_as::<_, Genre>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a genre and its category set in one transaction.
    pub async fn create(
        pool: &PgPool,
        input: &GenreInput,
    ) -> Result<(Genre, RelationChange), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO genres (name, is_active) \
             VALUES ($1, COALESCE($2, true)) \
             RETURNING {COLUMNS}"
        );
        let genre = sqlx::query_as::<_, Genre>(&query)
            .bind(&input.name)
            .bind(input.is_active)
            .fetch_one(&mut *tx)
            .await?;

        let change = Self::sync_categories_inner(&mut tx, genre.id, input.category_ids()).await?;

        tx.commit().await?;
        Ok((genre, change))
    }

    /// Update a live genre and replace its category set in one transaction.
    ///
    /// Returns `None` if no such row exists, and no change when the
    /// category set was not submitted. A failed category sync rolls back
    /// the column changes too.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &GenreInput,
    ) -> Result<Option<(Genre, Option<RelationChange>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE genres SET \
                name = COALESCE($2, name), \
                is_active = COALESCE($3, is_active) \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        let genre = sqlx::query_as::<_, Genre>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.is_active)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(genre) = genre else {
            return Ok(None);
        };
        let change = match input.categories {
            Some(ref category_ids) => {
                Some(Self::sync_categories_inner(&mut tx, genre.id, category_ids).await?)
            }
            None => None,
        };

        tx.commit().await?;
        Ok(Some((genre, change)))
    }

    /// Soft-delete a genre. Returns `true` if a live row was deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE genres SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn restore(pool: &PgPool, id: DbId) -> Result<Option<Genre>, sqlx::Error> {
        let query = format!(
            "UPDATE genres SET deleted_at = NULL \
             WHERE id = $1 AND deleted_at IS NOT NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Genre>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a genre. Junction rows cascade.
    pub async fn hard_delete(pool: &PgPool, id: DbId) -> Result<Option<Genre>, sqlx::Error> {
        let query = format!("DELETE FROM genres WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Genre>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Which of `ids` are live genres.
    pub async fn existing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        existing_ids(pool, "genres", ids).await
    }

    /// Genres in `genre_ids` not linked to any of `category_ids`.
    pub async fn genres_missing_categories(
        pool: &PgPool,
        genre_ids: &[DbId],
        category_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        if genre_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar::<_, DbId>(
            "SELECT t.id FROM UNNEST($1::uuid[]) AS t(id) \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM category_genre cg \
                 WHERE cg.genre_id = t.id AND cg.category_id = ANY($2))",
        )
        .bind(genre_ids)
        .bind(category_ids)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Category association helpers
    // -----------------------------------------------------------------------

    /// Categories of a genre, soft-deleted ones included.
    pub async fn categories_for_genre(
        pool: &PgPool,
        genre_id: DbId,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!(
            "SELECT {CATEGORY_COLUMNS} \
             FROM categories c \
             JOIN category_genre cg ON cg.category_id = c.id \
             WHERE cg.genre_id = $1 \
             ORDER BY c.name, c.id"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(genre_id)
            .fetch_all(pool)
            .await
    }

    /// Categories for many genres in one query, keyed by genre id.
    pub async fn categories_for_genres(
        pool: &PgPool,
        genre_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<Category>>, sqlx::Error> {
        let mut by_genre: HashMap<DbId, Vec<Category>> = HashMap::new();
        if genre_ids.is_empty() {
            return Ok(by_genre);
        }
        let query = format!(
            "SELECT cg.genre_id, {CATEGORY_COLUMNS} \
             FROM categories c \
             JOIN category_genre cg ON cg.category_id = c.id \
             WHERE cg.genre_id = ANY($1) \
             ORDER BY c.name, c.id"
        );
        let rows = sqlx::query_as::<_, GenreCategoryRow>(&query)
            .bind(genre_ids)
            .fetch_all(pool)
            .await?;
        for row in rows {
            by_genre.entry(row.genre_id).or_default().push(row.category);
        }
        Ok(by_genre)
    }

    /// Attach categories to a page of genres.
    pub async fn with_categories(
        pool: &PgPool,
        genres: Vec<Genre>,
    ) -> Result<Vec<GenreWithCategories>, sqlx::Error> {
        let ids: Vec<DbId> = genres.iter().map(|g| g.id).collect();
        let mut by_genre = Self::categories_for_genres(pool, &ids).await?;
        Ok(genres
            .into_iter()
            .map(|genre| GenreWithCategories {
                categories: by_genre.remove(&genre.id).unwrap_or_default(),
                genre,
            })
            .collect())
    }

    /// Replace category associations within an existing transaction.
    pub async fn sync_categories_inner(
        tx: &mut PgTransaction<'_>,
        genre_id: DbId,
        category_ids: &[DbId],
    ) -> Result<RelationChange, sqlx::Error> {
        sync_pivot(tx, CATEGORY_PIVOT, genre_id, category_ids).await
    }
}
