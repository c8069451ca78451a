//! HTTP-level integration tests for the `/api/videos` resource: JSON and
//! multipart writes, relation rules, and stored file lifecycle.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{
    body_json, delete, get, post_json, post_multipart, put_json, put_multipart,
    send_unauthenticated, Part, TestApp,
};
use serde_json::{json, Value};
use sqlx::PgPool;

struct Catalog {
    category: String,
    genre: String,
    actor: String,
}

async fn seed(app: &TestApp) -> Catalog {
    let category = common::create_category(app, "Movies").await;
    let genre = common::create_genre(app, "Sci-Fi", &[&category]).await;
    let actor = common::create_cast_member(app, "Sigourney Weaver", 2).await;
    Catalog {
        category,
        genre,
        actor,
    }
}

fn payload(catalog: &Catalog) -> Value {
    json!({
        "title": "Alien",
        "description": "In space no one can hear you scream.",
        "year_launched": 1979,
        "opened": true,
        "rating": "18",
        "duration": 117,
        "categories": [catalog.category],
        "genres": [catalog.genre],
        "cast_members": [catalog.actor],
    })
}

fn form<'a>(catalog: &'a Catalog, title: &'a str) -> Vec<Part<'a>> {
    vec![
        Part::Text("title", title),
        Part::Text("description", "Multipart upload"),
        Part::Text("year_launched", "1986"),
        Part::Text("rating", "16"),
        Part::Text("duration", "137"),
        Part::Text("categories[]", &catalog.category),
        Part::Text("genres[]", &catalog.genre),
    ]
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_store_json_returns_resource_with_relations(pool: PgPool) {
    let app = TestApp::new(pool);
    let catalog = seed(&app).await;

    let response = post_json(app.router(), "/api/videos", payload(&catalog)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let data = &json["data"];

    assert_eq!(data["title"], "Alien");
    assert_eq!(data["year_launched"], 1979);
    assert_eq!(data["opened"], true);
    assert_eq!(data["rating"], "18");
    assert_eq!(data["duration"], 117);
    assert_eq!(data["categories"][0]["id"], catalog.category.as_str());
    assert_eq!(data["genres"][0]["id"], catalog.genre.as_str());
    assert_eq!(data["cast_members"][0]["id"], catalog.actor.as_str());
    assert!(data["video"].is_null());
    assert!(data["thumb"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_store_reports_every_field_rule(pool: PgPool) {
    let app = TestApp::new(pool);

    let response = post_json(
        app.router(),
        "/api/videos",
        json!({
            "title": "t".repeat(256),
            "year_launched": "79",
            "opened": "sometimes",
            "rating": "21",
            "duration": 0,
            "categories": [uuid::Uuid::new_v4().to_string()],
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = body_json(response).await["errors"].clone();

    assert_eq!(errors["title"][0]["code"], "max");
    assert_eq!(errors["description"][0]["code"], "required");
    assert_eq!(errors["year_launched"][0]["code"], "date_format");
    assert_eq!(errors["opened"][0]["code"], "boolean");
    assert_eq!(errors["rating"][0]["code"], "in");
    assert_eq!(errors["duration"][0]["code"], "min");
    assert_eq!(errors["categories"][0]["code"], "exists");
    assert_eq!(errors["genres"][0]["code"], "required");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_genre_must_belong_to_submitted_category(pool: PgPool) {
    let app = TestApp::new(pool);
    let catalog = seed(&app).await;
    let other = common::create_category(&app, "Series").await;

    let mut body = payload(&catalog);
    body["categories"] = json!([other]);
    let response = post_json(app.router(), "/api/videos", body).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["errors"]["genres"][0]["code"], "genres_has_categories");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_without_cast_keeps_existing_cast(pool: PgPool) {
    let app = TestApp::new(pool);
    let catalog = seed(&app).await;
    let created = body_json(post_json(app.router(), "/api/videos", payload(&catalog)).await).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let mut body = payload(&catalog);
    body.as_object_mut().unwrap().remove("cast_members");
    body["title"] = json!("Aliens");
    let response = put_json(app.router(), &format!("/api/videos/{id}"), body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Aliens");
    assert_eq!(json["data"]["cast_members"][0]["id"], catalog.actor.as_str());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_multipart_store_places_files(pool: PgPool) {
    let app = TestApp::new(pool);
    let catalog = seed(&app).await;

    let mut parts = form(&catalog, "Aliens");
    parts.push(Part::File {
        name: "video_file",
        file_name: "aliens.mp4",
        content_type: "video/mp4",
        bytes: b"fake mp4 bytes",
    });
    parts.push(Part::File {
        name: "thumb_file",
        file_name: "poster.PNG",
        content_type: "image/png",
        bytes: b"fake png bytes",
    });

    let response = post_multipart(app.router(), "/api/videos", &parts).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let data = &json["data"];
    let id: uuid::Uuid = data["id"].as_str().unwrap().parse().unwrap();

    let video_name = data["video"]["name"].as_str().unwrap();
    assert!(video_name.ends_with(".mp4"));
    assert_eq!(
        data["video"]["url"],
        format!("http://catalog.test/storage/videos/{id}/{video_name}")
    );
    let thumb_name = data["thumb"]["name"].as_str().unwrap();
    assert!(thumb_name.ends_with(".png"));
    assert!(data["trailer"].is_null());

    let stored = std::fs::read(app.storage.path_for(id, video_name)).unwrap();
    assert_eq!(stored, b"fake mp4 bytes");
    assert!(app.storage.path_for(id, thumb_name).exists());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_multipart_rejects_wrong_mime_and_oversized_files(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let catalog = seed(&app).await;

    let oversized = vec![0u8; 5 * 1024 * 1024 + 1];
    let mut parts = form(&catalog, "Rejected");
    parts.push(Part::File {
        name: "video_file",
        file_name: "movie.png",
        content_type: "image/png",
        bytes: b"not a video",
    });
    parts.push(Part::File {
        name: "thumb_file",
        file_name: "huge.png",
        content_type: "image/png",
        bytes: &oversized,
    });

    let response = post_multipart(app.router(), "/api/videos", &parts).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["errors"]["video_file"][0]["code"], "mimetypes");
    assert_eq!(json["errors"]["thumb_file"][0]["code"], "max_file_size");

    let videos: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(videos, 0);

    let leftovers = std::fs::read_dir(app.storage.staging_dir())
        .map(|d| d.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0, "staged uploads must be removed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_json_file_field_is_rejected(pool: PgPool) {
    let app = TestApp::new(pool);
    let catalog = seed(&app).await;

    let mut body = payload(&catalog);
    body["video_file"] = json!("aliens.mp4");
    let response = post_json(app.router(), "/api/videos", body).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["errors"]["video_file"][0]["code"], "file");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_replaces_file_and_removes_previous(pool: PgPool) {
    let app = TestApp::new(pool);
    let catalog = seed(&app).await;

    let mut parts = form(&catalog, "Aliens");
    parts.push(Part::File {
        name: "banner_file",
        file_name: "old.jpg",
        content_type: "image/jpeg",
        bytes: b"old banner",
    });
    let created = body_json(post_multipart(app.router(), "/api/videos", &parts).await).await;
    let id: uuid::Uuid = created["data"]["id"].as_str().unwrap().parse().unwrap();
    let old_name = created["data"]["banner"]["name"].as_str().unwrap().to_string();

    let mut parts = form(&catalog, "Aliens (Director's Cut)");
    parts.push(Part::File {
        name: "banner_file",
        file_name: "new.jpg",
        content_type: "image/jpeg",
        bytes: b"new banner",
    });
    let response = put_multipart(app.router(), &format!("/api/videos/{id}"), &parts).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let new_name = json["data"]["banner"]["name"].as_str().unwrap();

    assert_ne!(new_name, old_name);
    assert!(!app.storage.path_for(id, &old_name).exists());
    assert_eq!(
        std::fs::read(app.storage.path_for(id, new_name)).unwrap(),
        b"new banner"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_soft_delete_keeps_files_force_delete_removes_them(pool: PgPool) {
    let app = TestApp::new(pool);
    let catalog = seed(&app).await;

    let mut parts = form(&catalog, "Prometheus");
    parts.push(Part::File {
        name: "trailer_file",
        file_name: "trailer.mp4",
        content_type: "video/mp4",
        bytes: b"trailer",
    });
    let created = body_json(post_multipart(app.router(), "/api/videos", &parts).await).await;
    let id: uuid::Uuid = created["data"]["id"].as_str().unwrap().parse().unwrap();
    let trailer = created["data"]["trailer"]["name"].as_str().unwrap().to_string();

    let response = delete(app.router(), &format!("/api/videos/{id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(app.storage.path_for(id, &trailer).exists());

    let response = delete(app.router(), &format!("/api/videos/{id}/force")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!app.storage.path_for(id, &trailer).exists());

    let response = get(app.router(), &format!("/api/videos/{id}?trashed=with")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_index_filters_by_relations(pool: PgPool) {
    let app = TestApp::new(pool);
    let catalog = seed(&app).await;
    post_json(app.router(), "/api/videos", payload(&catalog)).await;

    let mut other = payload(&catalog);
    other["title"] = json!("Blade Runner");
    other["cast_members"] = json!([]);
    post_json(app.router(), "/api/videos", other).await;

    let json = body_json(
        get(app.router(), &format!("/api/videos?cast_members={}", catalog.actor)).await,
    )
    .await;
    assert_eq!(json["meta"]["total"], 1);
    assert_eq!(json["data"][0]["title"], "Alien");

    let json = body_json(
        get(app.router(), &format!("/api/videos?genres={}&sort=title", catalog.genre)).await,
    )
    .await;
    assert_eq!(json["meta"]["total"], 2);
    assert_eq!(json["data"][0]["title"], "Alien");
    assert_eq!(json["data"][1]["title"], "Blade Runner");
}

fn public_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stored_files_are_public_but_staged_uploads_are_not(pool: PgPool) {
    let app = TestApp::new(pool);
    let catalog = seed(&app).await;

    let mut parts = form(&catalog, "Alien 3");
    parts.push(Part::File {
        name: "thumb_file",
        file_name: "thumb.png",
        content_type: "image/png",
        bytes: b"thumb bytes",
    });
    let created = body_json(post_multipart(app.router(), "/api/videos", &parts).await).await;
    let id = created["data"]["id"].as_str().unwrap();
    let thumb = created["data"]["thumb"]["name"].as_str().unwrap();

    let response = send_unauthenticated(
        app.router(),
        public_get(&format!("/storage/videos/{id}/{thumb}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // An upload still being received.
    let _in_flight = app.storage.stage(Some("mp4".into())).await.unwrap();
    let staged_name = std::fs::read_dir(app.storage.staging_dir())
        .unwrap()
        .next()
        .expect("one staged upload")
        .unwrap()
        .file_name()
        .into_string()
        .unwrap();
    assert!(!app.storage.staging_dir().starts_with(app.storage.root()));

    for uri in [
        format!("/storage/videos/{staged_name}"),
        format!("/storage/videos/.staging/{staged_name}"),
        format!("/storage/videos/../staging/{staged_name}"),
    ] {
        let response = send_unauthenticated(app.router(), public_get(&uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}
