//! Request handlers for the catalog resources.
//!
//! Each submodule provides async handler functions (index, show, store,
//! update, destroy, restore, force_destroy) for a single resource. Handlers
//! validate the payload, delegate to the corresponding repository in
//! `catalog_db`, publish a model event once the write is committed and map
//! errors via [`AppError`](crate::error::AppError).

pub mod cast_member;
pub mod category;
pub mod genre;
pub mod user;
pub mod video;

use axum::http::Uri;
use catalog_db::repositories::RelationChange;
use catalog_events::{ModelAction, ModelEvent};

use crate::state::AppState;

/// Absolute URL of the current listing, used as the base of its links.
pub(crate) fn page_url(state: &AppState, uri: &Uri) -> String {
    format!("{}{}", state.config.app_url, uri.path())
}

/// Announce rows linked to or unlinked from a record by a committed sync.
pub(crate) fn publish_relation_changes(state: &AppState, changes: &[RelationChange]) {
    for change in changes {
        let sides = [
            (ModelAction::Attached, &change.attached),
            (ModelAction::Detached, &change.detached),
        ];
        for (action, ids) in sides {
            if !ids.is_empty() {
                state.event_bus.publish(ModelEvent::relation(
                    change.relation,
                    action,
                    change.owner_id,
                    ids,
                ));
            }
        }
    }
}
