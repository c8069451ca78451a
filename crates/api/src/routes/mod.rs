pub mod cast_member;
pub mod category;
pub mod genre;
pub mod health;
pub mod user;
pub mod video;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Every route here requires a bearer token; the auth layer is applied in
/// [`crate::router::build_app_router`].
///
/// ```text
/// /user                                   current user
///
/// /categories                             index, store
/// /categories/{id}                        show, update, destroy
/// /categories/{id}/restore                restore (POST)
/// /categories/{id}/force                  hard delete (DELETE)
///
/// /genres                                 same shape as /categories
/// /cast_members                           same shape as /categories
/// /videos                                 same shape, JSON or multipart writes
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/user", user::router())
        .nest("/categories", category::router())
        .nest("/genres", genre::router())
        .nest("/cast_members", cast_member::router())
        .nest("/videos", video::router())
}
