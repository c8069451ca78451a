use std::sync::Arc;

use crate::config::ServerConfig;
use crate::storage::VideoStorage;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: catalog_db::DbPool,
    /// Server configuration (JWT verification, link base URL).
    pub config: Arc<ServerConfig>,
    /// Bus that model-change events are published on after each commit.
    pub event_bus: Arc<catalog_events::EventBus>,
    /// Video file storage.
    pub storage: Arc<VideoStorage>,
}
