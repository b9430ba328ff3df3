use async_trait::async_trait;
use thiserror::Error;

use super::types::Notification;

/// Failure to push an event to a connection. Never retried.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The connection is not (or no longer) registered.
    #[error("Connection {0} is gone")]
    ConnectionGone(String),

    /// The event could not be encoded.
    #[error("Failed to encode notification: {0}")]
    Encode(String),

    /// The transport refused or dropped the push.
    #[error("Transport error delivering to {connection_id}: {reason}")]
    Transport {
        connection_id: String,
        reason: String,
    },
}

/// Pushes events to a single open connection.
///
/// Calls for the same connection are delivered in call order.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        connection_id: &str,
        notification: &Notification,
    ) -> Result<(), DeliveryError>;
}
