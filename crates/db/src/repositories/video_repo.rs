//! Repository for the `videos` table and its three junction tables.
//!
//! Video writes are orchestrated by the caller: uploaded files must be
//! moved into place between the row insert and the commit, so the write
//! methods here take an open transaction rather than a pool.

use std::collections::HashMap;

use catalog_core::catalog::VideoFileField;
use catalog_core::filter::ListQuery;
use catalog_core::types::DbId;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};

use crate::models::cast_member::CastMember;
use crate::models::category::Category;
use crate::models::genre::Genre;
use crate::models::video::{Video, VideoFilter, VideoInput, VideoRelations, VideoWithRelations};
use crate::repositories::cast_member_repo::QUALIFIED_COLUMNS as CAST_MEMBER_COLUMNS;
use crate::repositories::category_repo::QUALIFIED_COLUMNS as CATEGORY_COLUMNS;
use crate::repositories::genre_repo::QUALIFIED_COLUMNS as GENRE_COLUMNS;
use crate::repositories::{
    existing_ids, like_pattern, page_window, sync_pivot, trashed_clause, PgTransaction, Pivot,
    RelationChange,
};

/// Column list for the `videos` table.
const COLUMNS: &str = "id, title, description, year_launched, opened, rating, duration, \
    video_file, trailer_file, thumb_file, banner_file, created_at, updated_at, deleted_at";

/// Column list qualified with the `v` alias.
const QUALIFIED_COLUMNS: &str = "v.id, v.title, v.description, v.year_launched, v.opened, \
    v.rating, v.duration, v.video_file, v.trailer_file, v.thumb_file, v.banner_file, \
    v.created_at, v.updated_at, v.deleted_at";

const DEFAULT_ORDER: &str = "v.created_at DESC, v.id";

const CATEGORY_PIVOT: Pivot = Pivot {
    relation: "video_categories",
    table: "category_video",
    owner_column: "video_id",
    related_column: "category_id",
};

const GENRE_PIVOT: Pivot = Pivot {
    relation: "video_genres",
    table: "genre_video",
    owner_column: "video_id",
    related_column: "genre_id",
};

const CAST_MEMBER_PIVOT: Pivot = Pivot {
    relation: "video_cast_members",
    table: "cast_member_video",
    owner_column: "video_id",
    related_column: "cast_member_id",
};

/// A related row tagged with the video it was loaded for.
#[derive(FromRow)]
struct Tagged<T> {
    video_id: DbId,
    #[sqlx(flatten)]
    row: T,
}

/// Provides CRUD operations for videos and their associations.
pub struct VideoRepo;

impl VideoRepo {
    /// Binds: `$1` search pattern, `$2` opened, `$3` categories,
    /// `$4` genres, `$5` cast members (ids or names).
    fn where_clause(query: &ListQuery) -> String {
        format!(
            "{trashed} \
             AND ($1::text IS NULL OR v.title ILIKE $1 OR v.description ILIKE $1) \
             AND ($2::bool IS NULL OR v.opened = $2) \
             AND (cardinality($3::text[]) = 0 OR EXISTS ( \
                 SELECT 1 FROM category_video cv \
                 JOIN categories c ON c.id = cv.category_id \
                 WHERE cv.video_id = v.id \
                   AND (c.id::text = ANY($3) OR c.name = ANY($3)))) \
             AND (cardinality($4::text[]) = 0 OR EXISTS ( \
                 SELECT 1 FROM genre_video gv \
                 JOIN genres g ON g.id = gv.genre_id \
                 WHERE gv.video_id = v.id \
                   AND (g.id::text = ANY($4) OR g.name = ANY($4)))) \
             AND (cardinality($5::text[]) = 0 OR EXISTS ( \
                 SELECT 1 FROM cast_member_video mv \
                 JOIN cast_members m ON m.id = mv.cast_member_id \
                 WHERE mv.video_id = v.id \
                   AND (m.id::text = ANY($5) OR m.name = ANY($5))))",
            trashed = trashed_clause(query.trashed, "v"),
        )
    }

    pub async fn list(
        pool: &PgPool,
        query: &ListQuery,
        filter: &VideoFilter,
    ) -> Result<Vec<Video>, sqlx::Error> {
        let (limit, offset) = page_window(query);
        let sql = format!(
            "SELECT {QUALIFIED_COLUMNS} FROM videos v \
             WHERE {where_clause} \
             ORDER BY {order} \
             LIMIT $6 OFFSET $7",
            where_clause = Self::where_clause(query),
            order = query.order_by("v", DEFAULT_ORDER),
        );
        sqlx::query_as::<_, Video>(&sql)
            .bind(like_pattern(query.search.as_deref()))
            .bind(filter.opened)
            .bind(&filter.categories)
            .bind(&filter.genres)
            .bind(&filter.cast_members)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(
        pool: &PgPool,
        query: &ListQuery,
        filter: &VideoFilter,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!(
            "SELECT COUNT(*) FROM videos v WHERE {}",
            Self::where_clause(query)
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(like_pattern(query.search.as_deref()))
            .bind(filter.opened)
            .bind(&filter.categories)
            .bind(&filter.genres)
            .bind(&filter.cast_members)
            .fetch_one(pool)
            .await
    }

    /// Find a live video by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a video by ID, including soft-deleted rows.
    pub async fn find_by_id_with_trashed(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Transactional writes
    // -----------------------------------------------------------------------

    /// Insert the video columns. Relations and files are written separately.
    pub async fn insert(tx: &mut PgTransaction<'_>, input: &VideoInput) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos (title, description, year_launched, opened, rating, duration) \
             VALUES ($1, $2, $3, COALESCE($4, false), $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.year_launched)
            .bind(input.opened)
            .bind(&input.rating)
            .bind(input.duration)
            .fetch_one(&mut **tx)
            .await
    }

    /// Update the columns of a live video. Returns `None` if no such row
    /// exists.
    pub async fn update(
        tx: &mut PgTransaction<'_>,
        id: DbId,
        input: &VideoInput,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                year_launched = COALESCE($4, year_launched), \
                opened = COALESCE($5, opened), \
                rating = COALESCE($6, rating), \
                duration = COALESCE($7, duration) \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.year_launched)
            .bind(input.opened)
            .bind(&input.rating)
            .bind(input.duration)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Replace the category, genre and (when given) cast associations.
    ///
    /// Returns one change per submitted relation set.
    pub async fn sync_relations_inner(
        tx: &mut PgTransaction<'_>,
        video_id: DbId,
        input: &VideoInput,
    ) -> Result<Vec<RelationChange>, sqlx::Error> {
        let sets = [
            (CATEGORY_PIVOT, &input.categories),
            (GENRE_PIVOT, &input.genres),
            (CAST_MEMBER_PIVOT, &input.cast_members),
        ];
        let mut changes = Vec::new();
        for (pivot, ids) in sets {
            if let Some(ids) = ids {
                changes.push(sync_pivot(tx, pivot, video_id, ids).await?);
            }
        }
        Ok(changes)
    }

    /// Point file columns at newly stored files. Slots not in `files` keep
    /// their current value.
    pub async fn set_files(
        tx: &mut PgTransaction<'_>,
        video_id: DbId,
        files: &[(VideoFileField, String)],
    ) -> Result<Video, sqlx::Error> {
        let file_for = |field: VideoFileField| {
            files
                .iter()
                .find(|(f, _)| *f == field)
                .map(|(_, name)| name.as_str())
        };
        let query = format!(
            "UPDATE videos SET \
                video_file = COALESCE($2, video_file), \
                trailer_file = COALESCE($3, trailer_file), \
                thumb_file = COALESCE($4, thumb_file), \
                banner_file = COALESCE($5, banner_file) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(video_id)
            .bind(file_for(VideoFileField::Video))
            .bind(file_for(VideoFileField::Trailer))
            .bind(file_for(VideoFileField::Thumb))
            .bind(file_for(VideoFileField::Banner))
            .fetch_one(&mut **tx)
            .await
    }

    // -----------------------------------------------------------------------
    // Soft delete
    // -----------------------------------------------------------------------

    /// Soft-delete a video. Returns `true` if a live row was deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn restore(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET deleted_at = NULL \
             WHERE id = $1 AND deleted_at IS NOT NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a video. Junction rows cascade; stored files are
    /// the caller's to remove.
    pub async fn hard_delete(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("DELETE FROM videos WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Which of `ids` are live videos.
    pub async fn existing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        existing_ids(pool, "videos", ids).await
    }

    // -----------------------------------------------------------------------
    // Relation loaders
    // -----------------------------------------------------------------------

    /// Load `T` rows linked to `video_ids` through `join`, keyed by video.
    async fn tagged<T>(
        pool: &PgPool,
        columns: &str,
        from: &str,
        join: &str,
        order: &str,
        video_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<T>>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut by_video: HashMap<DbId, Vec<T>> = HashMap::new();
        if video_ids.is_empty() {
            return Ok(by_video);
        }
        let query = format!(
            "SELECT j.video_id, {columns} FROM {from} JOIN {join} \
             WHERE j.video_id = ANY($1) ORDER BY {order}"
        );
        let rows = sqlx::query_as::<_, Tagged<T>>(&query)
            .bind(video_ids)
            .fetch_all(pool)
            .await?;
        for tagged in rows {
            by_video.entry(tagged.video_id).or_default().push(tagged.row);
        }
        Ok(by_video)
    }

    /// Relations for many videos, soft-deleted targets included.
    pub async fn relations_for_videos(
        pool: &PgPool,
        video_ids: &[DbId],
    ) -> Result<HashMap<DbId, VideoRelations>, sqlx::Error> {
        let mut categories = Self::tagged::<Category>(
            pool,
            CATEGORY_COLUMNS,
            "categories c",
            "category_video j ON j.category_id = c.id",
            "c.name, c.id",
            video_ids,
        )
        .await?;
        let mut genres = Self::tagged::<Genre>(
            pool,
            GENRE_COLUMNS,
            "genres g",
            "genre_video j ON j.genre_id = g.id",
            "g.name, g.id",
            video_ids,
        )
        .await?;
        let mut cast_members = Self::tagged::<CastMember>(
            pool,
            CAST_MEMBER_COLUMNS,
            "cast_members m",
            "cast_member_video j ON j.cast_member_id = m.id",
            "m.name, m.id",
            video_ids,
        )
        .await?;

        Ok(video_ids
            .iter()
            .map(|id| {
                let relations = VideoRelations {
                    categories: categories.remove(id).unwrap_or_default(),
                    genres: genres.remove(id).unwrap_or_default(),
                    cast_members: cast_members.remove(id).unwrap_or_default(),
                };
                (*id, relations)
            })
            .collect())
    }

    /// Attach relations to a page of videos.
    pub async fn with_relations(
        pool: &PgPool,
        videos: Vec<Video>,
    ) -> Result<Vec<VideoWithRelations>, sqlx::Error> {
        let ids: Vec<DbId> = videos.iter().map(|v| v.id).collect();
        let mut by_video = Self::relations_for_videos(pool, &ids).await?;
        Ok(videos
            .into_iter()
            .map(|video| VideoWithRelations {
                relations: by_video.remove(&video.id).unwrap_or_default(),
                video,
            })
            .collect())
    }
}
