use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::genre;
use crate::state::AppState;

/// Routes mounted at `/genres`.
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
        .route("/", get(genre::index).post(genre::store))
        .route(
            "/{id}",
            get(genre::show).put(genre::update).delete(genre::destroy),
        )
        .route("/{id}/restore", post(genre::restore))
        .route("/{id}/force", delete(genre::force_destroy))
}
