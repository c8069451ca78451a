use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::category;
use crate::state::AppState;

/// Routes mounted at `/categories`.
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
        .route("/", get(category::index).post(category::store))
        .route(
            "/{id}",
            get(category::show).put(category::update).delete(category::destroy),
        )
        .route("/{id}/restore", post(category::restore))
        .route("/{id}/force", delete(category::force_destroy))
}
