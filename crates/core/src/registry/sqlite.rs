//! SQLite-backed connection registry.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};

use super::{ConnectionRegistry, RegistryError};

/// SQLite-backed connection registry.
pub struct SqliteConnectionRegistry {
    conn: Mutex<Connection>,
}

impl SqliteConnectionRegistry {
    /// Open (or create) the registry database at `path`.
    pub fn new(path: &Path) -> Result<Self, RegistryError> {
        let conn = Connection::open(path).map_err(|e| RegistryError::Store(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory registry (useful for testing).
    pub fn in_memory() -> Result<Self, RegistryError> {
        let conn =
            Connection::open_in_memory().map_err(|e| RegistryError::Store(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), RegistryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS connections (
                connection_id TEXT PRIMARY KEY,
                connected_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| RegistryError::Store(e.to_string()))?;

        Ok(())
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, RegistryError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RegistryError::Unavailable(format!("Lock poisoned: {}", e)))?;
        f(&conn).map_err(|e| RegistryError::Store(e.to_string()))
    }
}

#[async_trait]
impl ConnectionRegistry for SqliteConnectionRegistry {
    async fn register(&self, connection_id: &str) -> Result<(), RegistryError> {
        let now = Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO connections (connection_id, connected_at) VALUES (?1, ?2)",
                params![connection_id, now],
            )
        })?;
        Ok(())
    }

    async fn deregister(&self, connection_id: &str) -> Result<(), RegistryError> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM connections WHERE connection_id = ?1",
                params![connection_id],
            )
        })?;
        Ok(())
    }

    async fn is_registered(&self, connection_id: &str) -> Result<bool, RegistryError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM connections WHERE connection_id = ?1)",
                params![connection_id],
                |row| row.get::<_, bool>(0),
            )
        })
    }

    async fn count(&self) -> Result<u64, RegistryError> {
        let count: i64 = self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM connections", [], |row| row.get(0))
        })?;
        Ok(count as u64)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_register_then_lookup() {
        let registry = SqliteConnectionRegistry::in_memory().unwrap();
        registry.register("conn-1").await.unwrap();

        assert!(registry.is_registered("conn-1").await.unwrap());
        assert!(!registry.is_registered("conn-2").await.unwrap());
        assert_eq!(registry.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_twice_keeps_single_row() {
        let registry = SqliteConnectionRegistry::in_memory().unwrap();
        registry.register("conn-1").await.unwrap();
        registry.register("conn-1").await.unwrap();

        assert_eq!(registry.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_deregister_is_idempotent() {
        let registry = SqliteConnectionRegistry::in_memory().unwrap();
        registry.register("conn-1").await.unwrap();

        registry.deregister("conn-1").await.unwrap();
        registry.deregister("conn-1").await.unwrap();
        registry.deregister("never-seen").await.unwrap();

        assert!(!registry.is_registered("conn-1").await.unwrap());
        assert_eq!(registry.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_registry_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.db");

        {
            let registry = SqliteConnectionRegistry::new(&path).unwrap();
            registry.register("conn-durable").await.unwrap();
        }

        let reopened = SqliteConnectionRegistry::new(&path).unwrap();
        assert!(reopened.is_registered("conn-durable").await.unwrap());
    }

    #[test]
    fn test_backend_name() {
        let registry = SqliteConnectionRegistry::in_memory().unwrap();
        assert_eq!(registry.backend_name(), "sqlite");
    }
}
