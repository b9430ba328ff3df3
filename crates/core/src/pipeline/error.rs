//! Error taxonomy for job handling.

use thiserror::Error;

use crate::notifier::DeliveryError;
use crate::separator::SeparationError;
use crate::storage::{LocationError, StorageError};

/// Malformed or unroutable requests. Never retried.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The body is not JSON or carries no string `url`.
    #[error("No url provided")]
    MissingUrl,

    /// The url cannot be mapped to a bucket and key.
    #[error("Invalid source url: {0}")]
    InvalidUrl(#[from] LocationError),

    /// The event names a route this service does not handle.
    #[error("Invalid route key: {0}")]
    InvalidRoute(String),
}

impl ValidationError {
    /// Message pushed to the client.
    pub fn client_message(&self) -> &'static str {
        match self {
            ValidationError::MissingUrl | ValidationError::InvalidUrl(_) => "No url provided",
            ValidationError::InvalidRoute(_) => "Invalid route key",
        }
    }

    /// Transport status for the triggering event.
    pub fn status_code(&self) -> u16 {
        match self {
            ValidationError::MissingUrl | ValidationError::InvalidUrl(_) => 400,
            // Unroutable events are treated as a server fault
            ValidationError::InvalidRoute(_) => 500,
        }
    }
}

/// Why a job failed.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Downloading the source failed.
    #[error("Fetch failed: {0}")]
    Fetch(#[source] StorageError),

    /// Preparing the scratch workspace failed.
    #[error("Workspace setup failed: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("Separation failed: {0}")]
    Separation(#[from] SeparationError),

    /// Uploading a separated track failed.
    #[error("Publish failed: {0}")]
    Publish(#[source] StorageError),

    /// Deleting the remote source failed under a strict retention policy.
    #[error("Source cleanup failed: {0}")]
    SourceCleanup(#[source] StorageError),

    /// Every stage succeeded but a push to the client did not.
    #[error("Notification delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

impl JobError {
    /// Message carried by the terminal `error` notification.
    pub fn client_message(&self) -> &'static str {
        match self {
            JobError::Validation(e) => e.client_message(),
            JobError::Fetch(_) | JobError::Workspace(_) => "Error downloading audio file",
            JobError::Separation(_) => "Error splitting audio file",
            JobError::Publish(_) => "Error uploading audio files",
            JobError::SourceCleanup(_) => "Error deleting audio file from s3 during cleanup",
            JobError::Delivery(_) => "Error delivering notification",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            JobError::Validation(e) => e.status_code(),
            _ => 500,
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Validation(_) => "validation",
            JobError::Fetch(_) => "fetch",
            JobError::Workspace(_) => "workspace",
            JobError::Separation(_) => "separation",
            JobError::Publish(_) => "publish",
            JobError::SourceCleanup(_) => "source_cleanup",
            JobError::Delivery(_) => "delivery",
        }
    }
}
