//! Genre entity model and DTOs.
//!
//! Genres belong to one or more categories via the `category_genre`
//! junction table.

use catalog_core::catalog::CatalogModel;
use catalog_core::filter::{split_csv, ListSpec, RawListParams};
use catalog_core::types::{DbId, Timestamp};
use catalog_core::validation::Payload;
use serde::Serialize;
use sqlx::FromRow;
use validator::Validate;

use super::category::{parse_flag, Category};

/// Sortable columns and paging rules for `GET /genres`.
pub const GENRE_LIST: ListSpec = ListSpec::new(&["name", "is_active", "created_at"]);

/// A genre row from the `genres` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Genre {
    pub id: DbId,
    pub name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl CatalogModel for Genre {
    const MODEL_NAME: &'static str = "genre";

    fn model_id(&self) -> DbId {
        self.id
    }
}

/// A genre enriched with its categories (soft-deleted ones included).
#[derive(Debug, Clone, Serialize)]
pub struct GenreWithCategories {
    #[serde(flatten)]
    pub genre: Genre,
    pub categories: Vec<Category>,
}

/// Store/update payload for a genre.
#[derive(Debug, Clone, Default, Validate)]
pub struct GenreInput {
    #[validate(required(code = "required"), length(max = 255, code = "max"))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
    /// Replaces the genre's category set.
    #[validate(required(code = "required"), length(min = 1, code = "required"))]
    pub categories: Option<Vec<DbId>>,
}

impl GenreInput {
    pub fn read(payload: &mut Payload<'_>) -> Self {
        Self {
            name: payload.string("name"),
            is_active: payload.boolean("is_active"),
            categories: payload.id_list("categories"),
        }
    }

    pub fn category_ids(&self) -> &[DbId] {
        self.categories.as_deref().unwrap_or_default()
    }
}

/// Resource-specific list filters (`?is_active=`, `?categories=a,b`).
///
/// `categories` matches by category id or by category name.
#[derive(Debug, Clone, Default)]
pub struct GenreFilter {
    pub is_active: Option<bool>,
    pub categories: Vec<String>,
}

impl GenreFilter {
    pub fn from_params(raw: &RawListParams) -> Self {
        Self {
            is_active: raw.extra("is_active").and_then(parse_flag),
            categories: raw.extra("categories").map(split_csv).unwrap_or_default(),
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(active) = self.is_active {
            pairs.push(("is_active", active.to_string()));
        }
        if !self.categories.is_empty() {
            pairs.push(("categories", self.categories.join(",")));
        }
        pairs
    }
}
