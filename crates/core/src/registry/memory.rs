//! In-memory connection registry for single-process deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ConnectionRegistry, RegistryError};

/// Registry backed by a process-local map. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryConnectionRegistry {
    connections: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl MemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for MemoryConnectionRegistry {
    async fn register(&self, connection_id: &str) -> Result<(), RegistryError> {
        self.connections
            .write()
            .await
            .insert(connection_id.to_string(), Utc::now());
        Ok(())
    }

    async fn deregister(&self, connection_id: &str) -> Result<(), RegistryError> {
        self.connections.write().await.remove(connection_id);
        Ok(())
    }

    async fn is_registered(&self, connection_id: &str) -> Result<bool, RegistryError> {
        Ok(self.connections.read().await.contains_key(connection_id))
    }

    async fn count(&self) -> Result<u64, RegistryError> {
        Ok(self.connections.read().await.len() as u64)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_registry_roundtrip() {
        let registry = MemoryConnectionRegistry::new();
        registry.register("a").await.unwrap();
        registry.register("b").await.unwrap();
        registry.deregister("a").await.unwrap();

        assert!(!registry.is_registered("a").await.unwrap());
        assert!(registry.is_registered("b").await.unwrap());
        assert_eq!(registry.count().await.unwrap(), 1);
    }
}
