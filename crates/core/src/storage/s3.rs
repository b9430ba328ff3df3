//! S3 blob store over plain HTTP with presigned requests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header::CONTENT_LENGTH, Body, Client, Method, RequestBuilder, Response, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::error::StorageError;
use super::location::ObjectLocation;
use super::traits::BlobStore;
use crate::presign::{PresignAction, Presigner};

/// Lifetime of the URLs the store signs for its own requests.
const REQUEST_SIGNATURE_TTL: Duration = Duration::from_secs(300);

/// S3 (or S3-compatible) object store.
///
/// Every request is signed through the same [`Presigner`] that serves
/// client presign requests, so one credential path covers both.
pub struct S3BlobStore {
    client: Client,
    presigner: Arc<dyn Presigner>,
    public_host: String,
}

impl S3BlobStore {
    pub fn new(
        presigner: Arc<dyn Presigner>,
        public_host: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            presigner,
            public_host: public_host.into(),
        })
    }

    async fn send(
        &self,
        location: &ObjectLocation,
        action: PresignAction,
        with_body: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response, StorageError> {
        let url = self
            .presigner
            .presign(location, action, REQUEST_SIGNATURE_TTL)?;

        let method = match action {
            PresignAction::Get => Method::GET,
            PresignAction::Put => Method::PUT,
            PresignAction::Delete => Method::DELETE,
        };

        let request = with_body(self.client.request(method, url));
        Ok(request.send().await?)
    }
}

/// Maps a non-success response onto a storage error.
async fn error_for_status(location: &ObjectLocation, response: Response) -> StorageError {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return StorageError::NotFound {
            bucket: location.bucket.clone(),
            key: location.key.clone(),
        };
    }

    let message = response.text().await.unwrap_or_default();
    StorageError::Http {
        status: status.as_u16(),
        message: message.chars().take(512).collect(),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn name(&self) -> &str {
        "s3"
    }

    async fn get(&self, location: &ObjectLocation, dest: &Path) -> Result<u64, StorageError> {
        let response = self.send(location, PresignAction::Get, |r| r).await?;
        if !response.status().is_success() {
            return Err(error_for_status(location, response).await);
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(object = %location, bytes = written, "Downloaded object");
        Ok(written)
    }

    async fn put(&self, location: &ObjectLocation, source: &Path) -> Result<String, StorageError> {
        // Streamed from disk; S3 needs the length up front for non-chunked PUTs
        let file = tokio::fs::File::open(source).await?;
        let size = file.metadata().await?.len();

        let response = self
            .send(location, PresignAction::Put, |r| {
                r.header(CONTENT_LENGTH, size).body(Body::from(file))
            })
            .await?;
        if !response.status().is_success() {
            return Err(error_for_status(location, response).await);
        }

        debug!(object = %location, bytes = size, "Uploaded object");
        Ok(location.public_uri(&self.public_host))
    }

    async fn delete(&self, location: &ObjectLocation) -> Result<(), StorageError> {
        let response = self.send(location, PresignAction::Delete, |r| r).await?;
        let status = response.status();

        if status.is_success() || status == StatusCode::NOT_FOUND {
            if status == StatusCode::NOT_FOUND {
                warn!(object = %location, "Object already absent on delete");
            }
            return Ok(());
        }

        Err(error_for_status(location, response).await)
    }
}
