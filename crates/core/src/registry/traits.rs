use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a connection registry backend.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry store error: {0}")]
    Store(String),

    #[error("Registry unavailable: {0}")]
    Unavailable(String),
}

/// Durable mapping of open connection identities.
///
/// `register` and `deregister` are idempotent: registering a present id
/// refreshes it, deregistering an absent id is a no-op.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Record a connection as open.
    async fn register(&self, connection_id: &str) -> Result<(), RegistryError>;

    /// Forget a connection.
    async fn deregister(&self, connection_id: &str) -> Result<(), RegistryError>;

    /// Whether the connection is currently registered.
    async fn is_registered(&self, connection_id: &str) -> Result<bool, RegistryError>;

    /// Number of registered connections.
    async fn count(&self) -> Result<u64, RegistryError>;

    /// Name of this backend.
    fn backend_name(&self) -> &'static str;
}
