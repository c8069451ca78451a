//! Video entity model and DTOs.
//!
//! A video links to categories, genres and cast members through the
//! `category_video`, `genre_video` and `cast_member_video` junction tables,
//! and owns up to four uploaded files (see [`VideoFileField`]).

use catalog_core::catalog::{CatalogModel, VideoFileField, RATINGS};
use catalog_core::filter::{split_csv, ListSpec, RawListParams};
use catalog_core::types::{DbId, Timestamp};
use catalog_core::validation::Payload;
use serde::Serialize;
use sqlx::FromRow;
use validator::Validate;

use super::cast_member::CastMember;
use super::category::Category;
use super::genre::Genre;

/// Sortable columns and paging rules for `GET /videos`.
pub const VIDEO_LIST: ListSpec =
    ListSpec::new(&["title", "year_launched", "rating", "duration", "created_at"]);

/// A video row from the `videos` table.
///
/// File columns hold the stored file name only; URLs are derived at the
/// API layer.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Video {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub year_launched: i16,
    pub opened: bool,
    pub rating: String,
    /// Minutes.
    pub duration: i32,
    pub video_file: Option<String>,
    pub trailer_file: Option<String>,
    pub thumb_file: Option<String>,
    pub banner_file: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Video {
    /// Stored file name for one of the four file slots.
    pub fn file(&self, field: VideoFileField) -> Option<&str> {
        match field {
            VideoFileField::Video => self.video_file.as_deref(),
            VideoFileField::Trailer => self.trailer_file.as_deref(),
            VideoFileField::Thumb => self.thumb_file.as_deref(),
            VideoFileField::Banner => self.banner_file.as_deref(),
        }
    }
}

impl CatalogModel for Video {
    const MODEL_NAME: &'static str = "video";

    fn model_id(&self) -> DbId {
        self.id
    }
}

/// Related rows of a video. Soft-deleted relations are included.
#[derive(Debug, Clone, Default)]
pub struct VideoRelations {
    pub categories: Vec<Category>,
    pub genres: Vec<Genre>,
    pub cast_members: Vec<CastMember>,
}

/// A video together with its relations.
#[derive(Debug, Clone)]
pub struct VideoWithRelations {
    pub video: Video,
    pub relations: VideoRelations,
}

/// Store/update payload for a video.
#[derive(Debug, Clone, Default, Validate)]
pub struct VideoInput {
    #[validate(required(code = "required"), length(max = 255, code = "max"))]
    pub title: Option<String>,
    #[validate(required(code = "required"))]
    pub description: Option<String>,
    #[validate(required(code = "required"))]
    pub year_launched: Option<i16>,
    /// Defaults to `false` on insert.
    pub opened: Option<bool>,
    #[validate(required(code = "required"))]
    pub rating: Option<String>,
    #[validate(required(code = "required"), range(min = 1, code = "min"))]
    pub duration: Option<i32>,
    #[validate(required(code = "required"), length(min = 1, code = "required"))]
    pub categories: Option<Vec<DbId>>,
    #[validate(required(code = "required"), length(min = 1, code = "required"))]
    pub genres: Option<Vec<DbId>>,
    /// Replaces the cast when present; `None` leaves it untouched.
    pub cast_members: Option<Vec<DbId>>,
}

impl VideoInput {
    pub fn read(payload: &mut Payload<'_>) -> Self {
        Self {
            title: payload.string("title"),
            description: payload.string("description"),
            year_launched: payload.year("year_launched"),
            opened: payload.boolean("opened"),
            rating: payload.one_of("rating", RATINGS),
            duration: payload.integer_as("duration"),
            categories: payload.id_list("categories"),
            genres: payload.id_list("genres"),
            cast_members: payload.id_list("cast_members"),
        }
    }

    pub fn category_ids(&self) -> &[DbId] {
        self.categories.as_deref().unwrap_or_default()
    }

    pub fn genre_ids(&self) -> &[DbId] {
        self.genres.as_deref().unwrap_or_default()
    }
}

/// Resource-specific list filters (`?categories=`, `?genres=`,
/// `?cast_members=`, `?opened=`), each a comma-separated list of ids or
/// names.
#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    pub opened: Option<bool>,
    pub categories: Vec<String>,
    pub genres: Vec<String>,
    pub cast_members: Vec<String>,
}

impl VideoFilter {
    pub fn from_params(raw: &RawListParams) -> Self {
        let list = |key| raw.extra(key).map(split_csv).unwrap_or_default();
        Self {
            opened: raw.extra("opened").and_then(super::category::parse_flag),
            categories: list("categories"),
            genres: list("genres"),
            cast_members: list("cast_members"),
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(opened) = self.opened {
            pairs.push(("opened", opened.to_string()));
        }
        for (key, values) in [
            ("categories", &self.categories),
            ("genres", &self.genres),
            ("cast_members", &self.cast_members),
        ] {
            if !values.is_empty() {
                pairs.push((key, values.join(",")));
            }
        }
        pairs
    }
}
