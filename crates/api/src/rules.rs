//! Request validation shared by the write handlers.
//!
//! Type checks come from [`Payload`], field rules from the DTO's
//! `validator` derive, and relation rules (`exists`,
//! `genres_has_categories`) from the database. All of them land in one
//! [`FieldErrors`] map so a single 422 reports everything.

use catalog_core::types::DbId;
use catalog_core::validation::{FieldErrors, Payload};
use catalog_db::repositories::{CastMemberRepo, CategoryRepo, GenreRepo};
use catalog_db::DbPool;
use serde_json::{Map, Value};
use validator::Validate;

/// Read a DTO from a JSON object and apply its type and field rules.
///
/// The returned errors may be extended with relation rules before being
/// turned into a response with [`FieldErrors::into_result`].
pub fn read_input<T, F>(fields: &Map<String, Value>, read: F) -> (T, FieldErrors)
where
    T: Validate,
    F: FnOnce(&mut Payload<'_>) -> T,
{
    let mut payload = Payload::new(fields);
    let input = read(&mut payload);
    let mut errors = payload.finish();
    if let Err(e) = input.validate() {
        errors.merge_validator(&e);
    }
    (input, errors)
}

/// A relation whose targets must exist and not be soft-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Categories,
    Genres,
    CastMembers,
}

impl Relation {
    /// Payload key carrying the related ids.
    pub fn field(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Genres => "genres",
            Self::CastMembers => "cast_members",
        }
    }

    async fn existing(self, pool: &DbPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        match self {
            Self::Categories => CategoryRepo::existing_ids(pool, ids).await,
            Self::Genres => GenreRepo::existing_ids(pool, ids).await,
            Self::CastMembers => CastMemberRepo::existing_ids(pool, ids).await,
        }
    }
}

/// Record `exists` on the relation's field when any id is unknown or
/// trashed. Skipped when the field already failed another rule.
pub async fn check_exists(
    pool: &DbPool,
    errors: &mut FieldErrors,
    relation: Relation,
    ids: &[DbId],
) -> Result<(), sqlx::Error> {
    let field = relation.field();
    if ids.is_empty() || errors.contains(field) {
        return Ok(());
    }
    let existing = relation.existing(pool, ids).await?;
    record_missing(errors, field, ids, &existing);
    Ok(())
}

/// Record `exists` on `field` unless every requested id is in `existing`.
pub fn record_missing(errors: &mut FieldErrors, field: &str, requested: &[DbId], existing: &[DbId]) {
    let missing = requested.iter().filter(|id| !existing.contains(id)).count();
    if missing > 0 {
        tracing::debug!(field, missing, "Related ids not found");
        errors.add_code(field, "exists");
    }
}

/// Every submitted genre must belong to at least one submitted category.
///
/// Only checked once both lists passed their own rules.
pub async fn check_genres_have_categories(
    pool: &DbPool,
    errors: &mut FieldErrors,
    genre_ids: &[DbId],
    category_ids: &[DbId],
) -> Result<(), sqlx::Error> {
    if genre_ids.is_empty()
        || category_ids.is_empty()
        || errors.contains("genres")
        || errors.contains("categories")
    {
        return Ok(());
    }
    let unmatched = GenreRepo::genres_missing_categories(pool, genre_ids, category_ids).await?;
    if !unmatched.is_empty() {
        errors.add_code("genres", "genres_has_categories");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
