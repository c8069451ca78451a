//! Integration tests for soft-delete, restore, and hard-delete behaviour.
//!
//! Exercises the repository layer against a real database to verify that:
//! - Soft-deleted rows are hidden from `find_by_id` and default listings
//! - `trashed=with|only` listings include them
//! - Restoring a soft-deleted row makes it visible again
//! - Hard delete permanently removes a row, trashed or not
//! - Soft-deleted rows no longer count as existing relation targets

use catalog_core::catalog::CastMemberType;
use catalog_core::filter::{ListQuery, RawListParams};
use catalog_db::models::cast_member::{CastMemberFilter, CastMemberInput, CAST_MEMBER_LIST};
use catalog_db::models::category::{CategoryFilter, CategoryInput, CATEGORY_LIST};
use catalog_db::repositories::{CastMemberRepo, CategoryRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_category(name: &str) -> CategoryInput {
    CategoryInput {
        name: Some(name.to_string()),
        description: Some(Some("soft delete test".to_string())),
        is_active: None,
    }
}

fn category_query(trashed: Option<&str>) -> ListQuery {
    let raw = RawListParams {
        trashed: trashed.map(str::to_string),
        ..Default::default()
    };
    ListQuery::parse(&raw, &CATEGORY_LIST)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_soft_delete_hides_from_find_by_id(pool: PgPool) {
    let category = CategoryRepo::create(&pool, &new_category("Hidden"))
        .await
        .unwrap();

    let deleted = CategoryRepo::soft_delete(&pool, category.id).await.unwrap();
    assert!(deleted);

    assert!(CategoryRepo::find_by_id(&pool, category.id)
        .await
        .unwrap()
        .is_none());

    let trashed = CategoryRepo::find_by_id_with_trashed(&pool, category.id)
        .await
        .unwrap()
        .expect("row should still exist");
    assert!(trashed.deleted_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_soft_delete_is_idempotent(pool: PgPool) {
    let category = CategoryRepo::create(&pool, &new_category("Twice"))
        .await
        .unwrap();

    assert!(CategoryRepo::soft_delete(&pool, category.id).await.unwrap());
    assert!(!CategoryRepo::soft_delete(&pool, category.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_trashed_scopes_in_listings(pool: PgPool) {
    let live = CategoryRepo::create(&pool, &new_category("Live"))
        .await
        .unwrap();
    let gone = CategoryRepo::create(&pool, &new_category("Gone"))
        .await
        .unwrap();
    CategoryRepo::soft_delete(&pool, gone.id).await.unwrap();

    let filter = CategoryFilter::default();

    let without = CategoryRepo::list(&pool, &category_query(None), &filter)
        .await
        .unwrap();
    assert_eq!(without.len(), 1);
    assert_eq!(without[0].id, live.id);

    let with = category_query(Some("with"));
    assert_eq!(CategoryRepo::count(&pool, &with, &filter).await.unwrap(), 2);

    let only = CategoryRepo::list(&pool, &category_query(Some("only")), &filter)
        .await
        .unwrap();
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].id, gone.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_restore_makes_row_visible(pool: PgPool) {
    let category = CategoryRepo::create(&pool, &new_category("Back"))
        .await
        .unwrap();
    CategoryRepo::soft_delete(&pool, category.id).await.unwrap();

    let restored = CategoryRepo::restore(&pool, category.id)
        .await
        .unwrap()
        .expect("restore should return the row");
    assert!(restored.deleted_at.is_none());

    assert!(CategoryRepo::find_by_id(&pool, category.id)
        .await
        .unwrap()
        .is_some());

    // Restoring a live row is a no-op.
    assert!(CategoryRepo::restore(&pool, category.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_hard_delete_removes_trashed_row(pool: PgPool) {
    let category = CategoryRepo::create(&pool, &new_category("Purged"))
        .await
        .unwrap();
    CategoryRepo::soft_delete(&pool, category.id).await.unwrap();

    let removed = CategoryRepo::hard_delete(&pool, category.id)
        .await
        .unwrap()
        .expect("row should be removed");
    assert!(removed.deleted_at.is_some());

    assert!(CategoryRepo::find_by_id_with_trashed(&pool, category.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_trashed_rows_are_not_existing_targets(pool: PgPool) {
    let kept = CategoryRepo::create(&pool, &new_category("Kept"))
        .await
        .unwrap();
    let trashed = CategoryRepo::create(&pool, &new_category("Trashed"))
        .await
        .unwrap();
    CategoryRepo::soft_delete(&pool, trashed.id).await.unwrap();

    let existing = CategoryRepo::existing_ids(&pool, &[kept.id, trashed.id, uuid::Uuid::new_v4()])
        .await
        .unwrap();
    assert_eq!(existing, vec![kept.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cast_member_type_filter_respects_trash(pool: PgPool) {
    let director = CastMemberRepo::create(
        &pool,
        &CastMemberInput {
            name: Some("Director".to_string()),
            member_type: Some(CastMemberType::Director),
        },
    )
    .await
    .unwrap();
    let actor = CastMemberRepo::create(
        &pool,
        &CastMemberInput {
            name: Some("Actor".to_string()),
            member_type: Some(CastMemberType::Actor),
        },
    )
    .await
    .unwrap();
    assert_eq!(actor.member_type, 2);

    let query = ListQuery::parse(&RawListParams::default(), &CAST_MEMBER_LIST);
    let directors = CastMemberFilter {
        member_type: Some(CastMemberType::Director),
    };

    let found = CastMemberRepo::list(&pool, &query, &directors).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, director.id);

    CastMemberRepo::soft_delete(&pool, director.id).await.unwrap();
    assert_eq!(
        CastMemberRepo::count(&pool, &query, &directors).await.unwrap(),
        0
    );
}
