//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`ModelEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use std::fmt;

use catalog_core::catalog::CatalogModel;
use catalog_core::types::{DbId, Timestamp};
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// ModelAction
// ---------------------------------------------------------------------------

/// What happened to a record, or to one of its relation sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelAction {
    Created,
    Updated,
    Deleted,
    Attached,
    Detached,
}

impl ModelAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Attached => "attached",
            Self::Detached => "detached",
        }
    }
}

impl fmt::Display for ModelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ModelEvent
// ---------------------------------------------------------------------------

/// A committed change to one catalog record.
///
/// `payload` is the message body sent downstream: the serialized row for
/// `created`/`updated`, `{"id": ...}` for `deleted`, and
/// `{"id": ..., "relation_ids": [...]}` for `attached`/`detached`.
#[derive(Debug, Clone)]
pub struct ModelEvent {
    /// snake_case model name, e.g. `"cast_member"`, or relation set name,
    /// e.g. `"genre_categories"`.
    pub model: &'static str,
    pub action: ModelAction,
    pub id: DbId,
    pub payload: serde_json::Value,
    pub occurred_at: Timestamp,
}

impl ModelEvent {
    pub fn created<M: CatalogModel + Serialize>(model: &M) -> Self {
        Self::with_row(model, ModelAction::Created)
    }

    pub fn updated<M: CatalogModel + Serialize>(model: &M) -> Self {
        Self::with_row(model, ModelAction::Updated)
    }

    /// A deletion carries only the id, so the row need not be loaded.
    pub fn deleted<M: CatalogModel>(id: DbId) -> Self {
        Self {
            model: M::MODEL_NAME,
            action: ModelAction::Deleted,
            id,
            payload: serde_json::json!({ "id": id }),
            occurred_at: chrono::Utc::now(),
        }
    }

    /// Rows linked to (`Attached`) or unlinked from (`Detached`) the owner
    /// `id` in the relation set `relation`.
    pub fn relation(
        relation: &'static str,
        action: ModelAction,
        id: DbId,
        relation_ids: &[DbId],
    ) -> Self {
        Self {
            model: relation,
            action,
            id,
            payload: serde_json::json!({ "id": id, "relation_ids": relation_ids }),
            occurred_at: chrono::Utc::now(),
        }
    }

    fn with_row<M: CatalogModel + Serialize>(model: &M, action: ModelAction) -> Self {
        let id = model.model_id();
        let payload = serde_json::to_value(model).unwrap_or_else(|e| {
            tracing::warn!(model = M::MODEL_NAME, %id, error = %e, "Falling back to id-only event payload");
            serde_json::json!({ "id": id })
        });
        Self {
            model: M::MODEL_NAME,
            action,
            id,
            payload,
            occurred_at: chrono::Utc::now(),
        }
    }

    /// Topic routing key: `model.<model>.<action>`.
    pub fn routing_key(&self) -> String {
        format!("model.{}.{}", self.model, self.action)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`ModelEvent`].
pub struct EventBus {
    sender: broadcast::Sender<ModelEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers (broker sync disabled) the event is dropped.
    pub fn publish(&self, event: ModelEvent) {
        tracing::debug!(routing_key = %event.routing_key(), "Model event published");
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
