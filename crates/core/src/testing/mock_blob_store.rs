//! Mock blob store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{BlobStore, ObjectLocation, StorageError};

/// An operation recorded by [`MockBlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobOperation {
    Get(ObjectLocation),
    Put(ObjectLocation),
    Delete(ObjectLocation),
}

/// In-memory implementation of the BlobStore trait.
///
/// Objects are held as byte vectors keyed by location. Each operation kind
/// can be made to fail once with `set_next_*_error`.
#[derive(Debug)]
pub struct MockBlobStore {
    public_host: String,
    objects: Arc<RwLock<HashMap<ObjectLocation, Vec<u8>>>>,
    operations: Arc<RwLock<Vec<BlobOperation>>>,
    next_get_error: Arc<RwLock<Option<StorageError>>>,
    next_put_error: Arc<RwLock<Option<StorageError>>>,
    next_delete_error: Arc<RwLock<Option<StorageError>>>,
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::with_public_host("s3.us-east-1.amazonaws.com")
    }

    pub fn with_public_host(host: impl Into<String>) -> Self {
        Self {
            public_host: host.into(),
            objects: Arc::new(RwLock::new(HashMap::new())),
            operations: Arc::new(RwLock::new(Vec::new())),
            next_get_error: Arc::new(RwLock::new(None)),
            next_put_error: Arc::new(RwLock::new(None)),
            next_delete_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Seeds an object.
    pub async fn insert(&self, location: ObjectLocation, data: impl Into<Vec<u8>>) {
        self.objects.write().await.insert(location, data.into());
    }

    pub async fn contains(&self, location: &ObjectLocation) -> bool {
        self.objects.read().await.contains_key(location)
    }

    /// Keys stored in a bucket, sorted.
    pub async fn keys_in(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .await
            .keys()
            .filter(|l| l.bucket == bucket)
            .map(|l| l.key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub async fn operations(&self) -> Vec<BlobOperation> {
        self.operations.read().await.clone()
    }

    pub async fn put_count(&self) -> usize {
        self.operations
            .read()
            .await
            .iter()
            .filter(|op| matches!(op, BlobOperation::Put(_)))
            .count()
    }

    pub async fn set_next_get_error(&self, error: StorageError) {
        *self.next_get_error.write().await = Some(error);
    }

    pub async fn set_next_put_error(&self, error: StorageError) {
        *self.next_put_error.write().await = Some(error);
    }

    pub async fn set_next_delete_error(&self, error: StorageError) {
        *self.next_delete_error.write().await = Some(error);
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get(&self, location: &ObjectLocation, dest: &Path) -> Result<u64, StorageError> {
        self.operations
            .write()
            .await
            .push(BlobOperation::Get(location.clone()));
        if let Some(error) = self.next_get_error.write().await.take() {
            return Err(error);
        }

        let data = self
            .objects
            .read()
            .await
            .get(location)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                bucket: location.bucket.clone(),
                key: location.key.clone(),
            })?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &data).await?;
        Ok(data.len() as u64)
    }

    async fn put(&self, location: &ObjectLocation, source: &Path) -> Result<String, StorageError> {
        self.operations
            .write()
            .await
            .push(BlobOperation::Put(location.clone()));
        if let Some(error) = self.next_put_error.write().await.take() {
            return Err(error);
        }

        let data = tokio::fs::read(source).await?;
        self.objects.write().await.insert(location.clone(), data);
        Ok(location.public_uri(&self.public_host))
    }

    async fn delete(&self, location: &ObjectLocation) -> Result<(), StorageError> {
        self.operations
            .write()
            .await
            .push(BlobOperation::Delete(location.clone()));
        if let Some(error) = self.next_delete_error.write().await.take() {
            return Err(error);
        }

        self.objects.write().await.remove(location);
        Ok(())
    }
}
