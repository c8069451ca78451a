use axum::routing::get;
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/user`.
///
/// ```text
/// GET /  -> current
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(user::current))
}
