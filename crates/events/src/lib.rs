//! Catalog change events and their downstream delivery.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ModelEvent`] -- a created/updated/deleted notification for one
//!   catalog record.
//! - [`MessageBroker`] / [`AmqpBroker`] -- outbound publishing to a topic
//!   exchange.
//! - [`ModelSync`] -- background service forwarding bus events to the
//!   broker. Failures are logged and never reach the request that caused
//!   the change.

pub mod broker;
pub mod bus;
pub mod sync;

pub use broker::{AmqpBroker, BrokerConfig, BrokerError, MessageBroker};
pub use bus::{EventBus, ModelAction, ModelEvent};
pub use sync::{ModelSync, SyncError};
