//! Connection registry: which connection identities are currently open.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryConnectionRegistry;
pub use sqlite::SqliteConnectionRegistry;
pub use traits::{ConnectionRegistry, RegistryError};

use crate::config::{RegistryBackend, RegistryConfig};

/// Factory function to create the configured registry backend
pub fn create_registry(
    config: &RegistryConfig,
) -> Result<Box<dyn ConnectionRegistry>, RegistryError> {
    match config.backend {
        RegistryBackend::Sqlite => Ok(Box::new(SqliteConnectionRegistry::new(&config.path)?)),
        RegistryBackend::Memory => Ok(Box::new(MemoryConnectionRegistry::new())),
    }
}
