//! Types for presigned URL issuance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::storage::ObjectLocation;

/// Errors raised while validating or signing a presign request.
#[derive(Debug, Error)]
pub enum PresignError {
    /// A required request field is absent.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// The requested action is not one of get, put, delete.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// The configured endpoint cannot be used for signing.
    #[error("Invalid storage endpoint: {0}")]
    InvalidEndpoint(String),

    /// The signing primitive rejected its input.
    #[error("Signing failed: {0}")]
    Signing(String),
}

impl PresignError {
    /// Whether the caller sent a bad request (as opposed to a server fault).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PresignError::MissingParameter(_) | PresignError::InvalidAction(_)
        )
    }
}

/// The single operation a presigned URL grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresignAction {
    Get,
    Put,
    Delete,
}

impl PresignAction {
    /// HTTP method the URL must be used with.
    pub fn http_method(&self) -> &'static str {
        match self {
            PresignAction::Get => "GET",
            PresignAction::Put => "PUT",
            PresignAction::Delete => "DELETE",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PresignAction::Get => "get",
            PresignAction::Put => "put",
            PresignAction::Delete => "delete",
        }
    }
}

impl FromStr for PresignAction {
    type Err = PresignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(PresignAction::Get),
            "put" => Ok(PresignAction::Put),
            "delete" => Ok(PresignAction::Delete),
            other => Err(PresignError::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for PresignAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated `{bucket, key, action}` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    pub location: ObjectLocation,
    pub action: PresignAction,
}

impl PresignRequest {
    /// Validates a raw JSON body.
    ///
    /// Fields are checked in the order bucket, key, action; the first missing
    /// one is reported.
    pub fn from_json(body: &serde_json::Value) -> Result<Self, PresignError> {
        let field = |name: &str| -> Result<String, PresignError> {
            body.get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| PresignError::MissingParameter(name.to_string()))
        };

        let bucket = field("bucket")?;
        let key = field("key")?;
        let action = field("action")?.parse::<PresignAction>()?;

        Ok(Self {
            location: ObjectLocation::new(bucket, key),
            action,
        })
    }
}
