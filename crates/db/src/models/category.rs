//! Category entity model and DTOs.

use catalog_core::catalog::CatalogModel;
use catalog_core::filter::{ListSpec, RawListParams};
use catalog_core::types::{DbId, Timestamp};
use catalog_core::validation::Payload;
use serde::Serialize;
use sqlx::FromRow;
use validator::Validate;

/// Sortable columns and paging rules for `GET /categories`.
pub const CATEGORY_LIST: ListSpec = ListSpec::new(&["name", "is_active", "created_at"]);

/// A category row from the `categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl CatalogModel for Category {
    const MODEL_NAME: &'static str = "category";

    fn model_id(&self) -> DbId {
        self.id
    }
}

/// Store/update payload for a category.
#[derive(Debug, Clone, Default, Validate)]
pub struct CategoryInput {
    #[validate(required(code = "required"), length(max = 255, code = "max"))]
    pub name: Option<String>,
    /// `None` leaves the column untouched, `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// Defaults to `true` on insert.
    pub is_active: Option<bool>,
}

impl CategoryInput {
    pub fn read(payload: &mut Payload<'_>) -> Self {
        Self {
            name: payload.string("name"),
            description: payload.nullable_string("description"),
            is_active: payload.boolean("is_active"),
        }
    }
}

/// Resource-specific list filters (`?is_active=`).
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub is_active: Option<bool>,
}

impl CategoryFilter {
    pub fn from_params(raw: &RawListParams) -> Self {
        Self {
            is_active: raw.extra("is_active").and_then(parse_flag),
        }
    }

    /// Wire form of the active filters, for pagination links.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.is_active
            .map(|a| vec![("is_active", a.to_string())])
            .unwrap_or_default()
    }
}

/// Parse a boolean query flag (`1/0/true/false`).
pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
