use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::video;
use crate::state::AppState;

/// Routes mounted at `/videos`.
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
///
/// The default body limit is lifted here: uploads are streamed to disk and
/// capped per file field instead.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(video::index).post(video::store))
        .route(
            "/{id}",
            get(video::show).put(video::update).delete(video::destroy),
        )
        .route("/{id}/restore", post(video::restore))
        .route("/{id}/force", delete(video::force_destroy))
        .layer(DefaultBodyLimit::disable())
}
