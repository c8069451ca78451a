//! Model synchronization service.
//!
//! [`ModelSync`] subscribes to the [`EventBus`](crate::bus::EventBus) and
//! forwards every [`ModelEvent`] to a [`MessageBroker`]. It runs as a
//! long-lived background task, so a failed publish is logged and dropped
//! without affecting the request that produced the event.

use std::sync::Arc;

use catalog_core::types::DbId;
use tokio::sync::broadcast;

use crate::broker::{BrokerError, MessageBroker};
use crate::bus::{ModelAction, ModelEvent};

/// A model change that could not be delivered downstream.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("The model {model} with ID {id} not synced on {action}")]
    NotSynced {
        model: &'static str,
        id: DbId,
        action: ModelAction,
        #[source]
        source: BrokerError,
    },
}

/// Background service that publishes model events to the broker.
pub struct ModelSync {
    broker: Arc<dyn MessageBroker>,
}

impl ModelSync {
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self { broker }
    }

    /// Run the sync loop.
    ///
    /// Exits when the channel is closed (i.e. the
    /// [`EventBus`](crate::bus::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<ModelEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.handle(&event).await {
                        let SyncError::NotSynced { ref source, .. } = e;
                        tracing::error!(
                            error = %e,
                            cause = %source,
                            model = event.model,
                            id = %event.id,
                            action = %event.action,
                            "Model sync failed"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Model sync lagged, some events were not published");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, model sync shutting down");
                    break;
                }
            }
        }
    }

    /// Publish a single event.
    pub async fn handle(&self, event: &ModelEvent) -> Result<(), SyncError> {
        let routing_key = event.routing_key();
        let body = event.payload.to_string();

        self.broker
            .publish(&routing_key, body.as_bytes())
            .await
            .map_err(|source| SyncError::NotSynced {
                model: event.model,
                id: event.id,
                action: event.action,
                source,
            })?;

        tracing::debug!(%routing_key, "Model event synced");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
