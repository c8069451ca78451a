//! Handler for the authenticated user.

use axum::Json;

use crate::middleware::auth::AuthUser;

/// GET /api/user
///
/// The identity resolved from the bearer token. Nothing is read from the
/// database; users live in the identity provider.
pub async fn current(user: AuthUser) -> Json<AuthUser> {
    Json(user)
}
