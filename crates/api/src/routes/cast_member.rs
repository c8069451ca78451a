use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::cast_member;
use crate::state::AppState;

/// Routes mounted at `/cast_members`.
///
/// ```text
/// GET    /                -> index
/// POST   /                -> store
/// GET    /{id}            -> show
/// PUT    /{id}            -> update
/// DELETE /{id}            -> destroy
/// POST   /{id}/restore    -> restore
/// DELETE /{id}/force      -> force_destroy
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cast_member::index).post(cast_member::store))
        .route(
            "/{id}",
            get(cast_member::show).put(cast_member::update).delete(cast_member::destroy),
        )
        .route("/{id}/restore", post(cast_member::restore))
        .route("/{id}/force", delete(cast_member::force_destroy))
}
