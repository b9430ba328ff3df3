//! Presigned URL issuance: time-limited URLs for one action on one object.

mod sigv4;
mod types;

pub use sigv4::{Credentials, S3Endpoint, SigV4Presigner};
pub use types::{PresignAction, PresignError, PresignRequest};

use std::time::Duration;

use crate::storage::ObjectLocation;

/// Issues URLs granting a single action on a single object.
pub trait Presigner: Send + Sync {
    fn presign(
        &self,
        location: &ObjectLocation,
        action: PresignAction,
        expires_in: Duration,
    ) -> Result<String, PresignError>;
}
