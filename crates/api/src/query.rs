//! Shared path and query parameter types for API handlers.
//!
//! List endpoints read [`catalog_core::filter::RawListParams`] directly;
//! the types here cover the remaining endpoints.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use catalog_core::filter::Trashed;
use catalog_core::types::DbId;
use serde::Deserialize;

use crate::error::AppError;

/// The `{id}` path segment of a single-record route.
///
/// A segment that is not a UUID is rejected with the JSON error envelope.
#[derive(Debug, Clone, Copy)]
pub struct RecordId(pub DbId);

impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<DbId>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(RecordId(id))
    }
}

/// Query parameters for `show` and the write endpoints (`?trashed=with`).
#[derive(Debug, Default, Deserialize)]
pub struct ShowParams {
    pub trashed: Option<String>,
}

impl ShowParams {
    /// Whether a soft-deleted row may be returned.
    pub fn with_trashed(&self) -> bool {
        matches!(
            self.trashed.as_deref().and_then(Trashed::parse),
            Some(Trashed::With | Trashed::Only)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trashed_flag_accepts_with_and_only() {
        let params = |v: Option<&str>| ShowParams {
            trashed: v.map(str::to_string),
        };
        assert!(params(Some("with")).with_trashed());
        assert!(params(Some("only")).with_trashed());
        assert!(!params(Some("yes")).with_trashed());
        assert!(!params(None).with_trashed());
    }
}
