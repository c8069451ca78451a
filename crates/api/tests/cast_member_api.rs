//! HTTP-level integration tests for the `/api/cast_members` resource.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, post, post_json, put_json, TestApp};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_store_accepts_numeric_and_string_type(pool: PgPool) {
    let app = TestApp::new(pool);

    let response = post_json(
        app.router(),
        "/api/cast_members",
        json!({"name": "Ridley Scott", "type": 1}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["type"], 1);
    assert_eq!(json["data"]["name"], "Ridley Scott");

    let response = post_json(
        app.router(),
        "/api/cast_members",
        json!({"name": "Sigourney Weaver", "type": "2"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["type"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_type_must_be_known(pool: PgPool) {
    let app = TestApp::new(pool);

    let response = post_json(
        app.router(),
        "/api/cast_members",
        json!({"name": "Nobody", "type": 3}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["errors"]["type"][0]["code"], "in");

    let response = post_json(app.router(), "/api/cast_members", json!({"name": "Nobody"})).await;
    let json = body_json(response).await;
    assert_eq!(json["errors"]["type"][0]["code"], "required");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_and_soft_delete_cycle(pool: PgPool) {
    let app = TestApp::new(pool);
    let id = common::create_cast_member(&app, "Actor One", 2).await;

    let response = put_json(
        app.router(),
        &format!("/api/cast_members/{id}"),
        json!({"name": "Director One", "type": 1}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["type"], 1);

    let response = delete(app.router(), &format!("/api/cast_members/{id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = delete(app.router(), &format!("/api/cast_members/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post(app.router(), &format!("/api/cast_members/{id}/restore")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["name"], "Director One");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_index_filters_by_type(pool: PgPool) {
    let app = TestApp::new(pool);
    common::create_cast_member(&app, "Director", 1).await;
    common::create_cast_member(&app, "Actor A", 2).await;
    common::create_cast_member(&app, "Actor B", 2).await;

    let json = body_json(get(app.router(), "/api/cast_members?type=2").await).await;
    assert_eq!(json["meta"]["total"], 2);
    assert!(json["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|m| m["type"] == 2));

    // Unknown types are ignored rather than matching nothing.
    let json = body_json(get(app.router(), "/api/cast_members?type=9").await).await;
    assert_eq!(json["meta"]["total"], 3);
}
