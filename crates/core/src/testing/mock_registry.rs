//! Mock connection registry for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::registry::{ConnectionRegistry, RegistryError};

/// A registry call recorded by [`MockRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    Register(String),
    Deregister(String),
}

/// Mock implementation of the ConnectionRegistry trait.
#[derive(Debug, Default)]
pub struct MockRegistry {
    connections: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<RegistryCall>>>,
    next_error: Arc<RwLock<Option<RegistryError>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<RegistryCall> {
        self.calls.read().await.clone()
    }

    /// The next register or deregister fails with this error.
    pub async fn set_next_error(&self, error: RegistryError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Result<(), RegistryError> {
        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConnectionRegistry for MockRegistry {
    async fn register(&self, connection_id: &str) -> Result<(), RegistryError> {
        self.calls
            .write()
            .await
            .push(RegistryCall::Register(connection_id.to_string()));
        self.take_error().await?;
        self.connections
            .write()
            .await
            .insert(connection_id.to_string());
        Ok(())
    }

    async fn deregister(&self, connection_id: &str) -> Result<(), RegistryError> {
        self.calls
            .write()
            .await
            .push(RegistryCall::Deregister(connection_id.to_string()));
        self.take_error().await?;
        self.connections.write().await.remove(connection_id);
        Ok(())
    }

    async fn is_registered(&self, connection_id: &str) -> Result<bool, RegistryError> {
        Ok(self.connections.read().await.contains(connection_id))
    }

    async fn count(&self) -> Result<u64, RegistryError> {
        Ok(self.connections.read().await.len() as u64)
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}
