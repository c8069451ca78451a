//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Writes that touch a
//! junction table take an open transaction instead, so relation sync
//! commits or rolls back together with the parent row.

use catalog_core::filter::{ListQuery, Trashed};
use catalog_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

pub mod cast_member_repo;
pub mod category_repo;
pub mod genre_repo;
pub mod video_repo;

pub use cast_member_repo::CastMemberRepo;
pub use category_repo::CategoryRepo;
pub use genre_repo::GenreRepo;
pub use video_repo::VideoRepo;

/// Transaction handle used by relation-aware writes.
pub type PgTransaction<'c> = Transaction<'c, Postgres>;

/// Which of `ids` exist as live (non-trashed) rows of `table`.
///
/// `table` is always a compile-time constant from a repository.
pub(crate) async fn existing_ids(
    pool: &PgPool,
    table: &str,
    ids: &[DbId],
) -> Result<Vec<DbId>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let query = format!("SELECT id FROM {table} WHERE id = ANY($1) AND deleted_at IS NULL");
    sqlx::query_scalar::<_, DbId>(&query)
        .bind(ids)
        .fetch_all(pool)
        .await
}

/// Junction rows added and removed by one relation sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationChange {
    /// Name of the relation set, e.g. `"genre_categories"`.
    pub relation: &'static str,
    pub owner_id: DbId,
    pub attached: Vec<DbId>,
    pub detached: Vec<DbId>,
}

impl RelationChange {
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty() && self.detached.is_empty()
    }
}

/// A junction table and the columns linking owner and related rows.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pivot {
    pub relation: &'static str,
    pub table: &'static str,
    pub owner_column: &'static str,
    pub related_column: &'static str,
}

/// Make `owner_id`'s rows in a junction table exactly `related_ids`.
///
/// Rows outside the new set are deleted, missing ones inserted; rows
/// already present keep their `created_at`. Returns what actually changed.
pub(crate) async fn sync_pivot(
    tx: &mut PgTransaction<'_>,
    pivot: Pivot,
    owner_id: DbId,
    related_ids: &[DbId],
) -> Result<RelationChange, sqlx::Error> {
    let Pivot {
        relation,
        table,
        owner_column,
        related_column,
    } = pivot;

    let delete = format!(
        "DELETE FROM {table} \
         WHERE {owner_column} = $1 AND NOT ({related_column} = ANY($2)) \
         RETURNING {related_column}"
    );
    let detached = sqlx::query_scalar::<_, DbId>(&delete)
        .bind(owner_id)
        .bind(related_ids)
        .fetch_all(&mut **tx)
        .await?;

    let attached = if related_ids.is_empty() {
        Vec::new()
    } else {
        let insert = format!(
            "INSERT INTO {table} ({owner_column}, {related_column}) \
             SELECT $1, UNNEST($2::uuid[]) \
             ON CONFLICT DO NOTHING \
             RETURNING {related_column}"
        );
        sqlx::query_scalar::<_, DbId>(&insert)
            .bind(owner_id)
            .bind(related_ids)
            .fetch_all(&mut **tx)
            .await?
    };

    tracing::debug!(
        relation,
        %owner_id,
        attached = attached.len(),
        detached = detached.len(),
        "Relation synced",
    );
    Ok(RelationChange {
        relation,
        owner_id,
        attached,
        detached,
    })
}

/// `WHERE` body for the soft-delete scope, always non-empty.
pub(crate) fn trashed_clause(trashed: Trashed, alias: &str) -> String {
    trashed
        .sql_predicate(alias)
        .unwrap_or_else(|| "TRUE".to_string())
}

/// `LIMIT`/`OFFSET` binds for a list query. `LIMIT NULL` returns every row.
pub(crate) fn page_window(query: &ListQuery) -> (Option<i64>, i64) {
    if query.all {
        (None, 0)
    } else {
        (Some(query.per_page), query.offset())
    }
}

/// `%term%` pattern for `ILIKE`, with wildcards in the term escaped.
pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    search.map(|s| {
        let escaped = s
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{escaped}%")
    })
}
