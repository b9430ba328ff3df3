//! Blob storage: fetching sources and publishing separated tracks.
//!
//! Objects are addressed by [`ObjectLocation`] (bucket + key). Two backends
//! exist:
//!
//! - [`S3BlobStore`]: S3 or an S3-compatible store, over presigned HTTP requests
//! - [`FsBlobStore`]: a local directory tree, for development and tests
//!
//! Both return public URIs of the shape `https://{bucket}.{host}/{key}`.

mod error;
mod fs;
mod location;
mod s3;
mod traits;

pub use error::StorageError;
pub use fs::FsBlobStore;
pub use location::{LocationError, ObjectLocation};
pub use s3::S3BlobStore;
pub use traits::BlobStore;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{StorageBackend, StorageConfig};
use crate::presign::SigV4Presigner;

/// Create a blob store from configuration.
pub fn create_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, StorageError> {
    match config.backend {
        StorageBackend::S3 => {
            let presigner = SigV4Presigner::from_config(config)?;
            let store = S3BlobStore::new(
                Arc::new(presigner),
                config.public_host(),
                Duration::from_secs(config.request_timeout_secs),
            )?;
            Ok(Arc::new(store))
        }
        StorageBackend::Filesystem => Ok(Arc::new(FsBlobStore::new(
            config.root.clone(),
            config.public_host(),
        ))),
    }
}
