//! Filesystem blob store: one directory per bucket under a root.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::error::StorageError;
use super::location::ObjectLocation;
use super::traits::BlobStore;

/// Blob store for local development and tests.
///
/// Objects live at `<root>/<bucket>/<key>`; returned URIs still use the
/// configured public host so clients see the production URI shape.
pub struct FsBlobStore {
    root: PathBuf,
    public_host: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_host: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_host: public_host.into(),
        }
    }

    /// Path of an object, refusing keys that escape the bucket directory.
    pub fn object_path(&self, location: &ObjectLocation) -> Result<PathBuf, StorageError> {
        let is_plain = |p: &Path| p.components().all(|c| matches!(c, Component::Normal(_)));

        if location.bucket.is_empty() || !is_plain(Path::new(&location.bucket)) {
            return Err(StorageError::InvalidKey(location.to_string()));
        }
        if location.key.is_empty() || !is_plain(Path::new(&location.key)) {
            return Err(StorageError::InvalidKey(location.to_string()));
        }

        Ok(self.root.join(&location.bucket).join(&location.key))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn get(&self, location: &ObjectLocation, dest: &Path) -> Result<u64, StorageError> {
        let path = self.object_path(location)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        match tokio::fs::copy(&path, dest).await {
            Ok(bytes) => {
                debug!(object = %location, bytes, "Copied object out of filesystem store");
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                bucket: location.bucket.clone(),
                key: location.key.clone(),
            }),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn put(&self, location: &ObjectLocation, source: &Path) -> Result<String, StorageError> {
        let path = self.object_path(location)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = tokio::fs::copy(source, &path).await?;
        debug!(object = %location, bytes, "Stored object in filesystem store");
        Ok(location.public_uri(&self.public_host))
    }

    async fn delete(&self, location: &ObjectLocation) -> Result<(), StorageError> {
        let path = self.object_path(location)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
