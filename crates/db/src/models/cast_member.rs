//! Cast member entity model and DTOs.

use catalog_core::catalog::{CastMemberType, CatalogModel};
use catalog_core::filter::{ListSpec, RawListParams};
use catalog_core::types::{DbId, Timestamp};
use catalog_core::validation::Payload;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Sortable columns and paging rules for `GET /cast_members`.
pub const CAST_MEMBER_LIST: ListSpec = ListSpec::new(&["name", "type", "created_at"]);

/// A cast member row from the `cast_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CastMember {
    pub id: DbId,
    pub name: String,
    /// 1 = director, 2 = actor. See [`CastMemberType`].
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub member_type: i16,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl CatalogModel for CastMember {
    const MODEL_NAME: &'static str = "cast_member";

    fn model_id(&self) -> DbId {
        self.id
    }
}

/// Store/update payload for a cast member.
///
/// The serde rename keeps validation errors keyed by the wire name `type`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CastMemberInput {
    #[validate(required(code = "required"), length(max = 255, code = "max"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    #[validate(required(code = "required"))]
    pub member_type: Option<CastMemberType>,
}

impl CastMemberInput {
    pub fn read(payload: &mut Payload<'_>) -> Self {
        Self {
            name: payload.string("name"),
            member_type: payload
                .one_of("type", CastMemberType::ALLOWED)
                .and_then(|raw| raw.parse().ok()),
        }
    }
}

/// Resource-specific list filters (`?type=1|2`). Unknown types are ignored.
#[derive(Debug, Clone, Default)]
pub struct CastMemberFilter {
    pub member_type: Option<CastMemberType>,
}

impl CastMemberFilter {
    pub fn from_params(raw: &RawListParams) -> Self {
        Self {
            member_type: raw.extra("type").and_then(|t| t.parse().ok()),
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.member_type
            .map(|t| vec![("type", t.as_i16().to_string())])
            .unwrap_or_default()
    }
}
