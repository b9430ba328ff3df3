//! Trait definitions for the storage module.

use async_trait::async_trait;
use std::path::Path;

use super::error::StorageError;
use super::location::ObjectLocation;

/// Object storage addressed by bucket and key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Downloads the object into `dest`, returning the number of bytes written.
    async fn get(&self, location: &ObjectLocation, dest: &Path) -> Result<u64, StorageError>;

    /// Uploads `source` to the object and returns its public URI.
    async fn put(&self, location: &ObjectLocation, source: &Path) -> Result<String, StorageError>;

    /// Deletes the object. Deleting a missing object succeeds.
    async fn delete(&self, location: &ObjectLocation) -> Result<(), StorageError>;
}
