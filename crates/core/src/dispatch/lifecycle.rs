//! Connect and disconnect handling.

use std::sync::Arc;

use tracing::{error, info};

use super::types::LifecycleOutcome;
use crate::metrics;
use crate::registry::ConnectionRegistry;

/// Keeps the connection registry in step with the transport.
///
/// No notification is pushed for lifecycle events.
pub struct LifecycleHandler {
    registry: Arc<dyn ConnectionRegistry>,
}

impl LifecycleHandler {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<dyn ConnectionRegistry> {
        &self.registry
    }

    pub async fn on_connect(&self, connection_id: &str) -> LifecycleOutcome {
        match self.registry.register(connection_id).await {
            Ok(()) => {
                record("register", true);
                info!(connection_id, "Connection registered");
                LifecycleOutcome::Accepted
            }
            Err(e) => {
                record("register", false);
                error!(connection_id, error = %e, "Failed to register connection");
                LifecycleOutcome::Rejected(e)
            }
        }
    }

    pub async fn on_disconnect(&self, connection_id: &str) -> LifecycleOutcome {
        match self.registry.deregister(connection_id).await {
            Ok(()) => {
                record("deregister", true);
                info!(connection_id, "Connection deregistered");
                LifecycleOutcome::Accepted
            }
            Err(e) => {
                record("deregister", false);
                error!(connection_id, error = %e, "Failed to deregister connection");
                LifecycleOutcome::Rejected(e)
            }
        }
    }
}

fn record(operation: &str, ok: bool) {
    metrics::REGISTRY_OPERATIONS
        .with_label_values(&[operation, if ok { "ok" } else { "error" }])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryConnectionRegistry;

    #[tokio::test]
    async fn test_connect_then_disconnect() {
        let registry = Arc::new(MemoryConnectionRegistry::new());
        let handler = LifecycleHandler::new(registry.clone());

        assert!(handler.on_connect("abc").await.is_accepted());
        assert!(registry.is_registered("abc").await.unwrap());

        assert!(handler.on_disconnect("abc").await.is_accepted());
        assert!(!registry.is_registered("abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_disconnect_unknown_is_accepted() {
        let handler = LifecycleHandler::new(Arc::new(MemoryConnectionRegistry::new()));
        assert!(handler.on_disconnect("never-seen").await.is_accepted());
        assert!(handler.on_disconnect("never-seen").await.is_accepted());
    }
}
