//! Addressing of objects by bucket and key.

use std::fmt;
use std::path::Path;

use thiserror::Error;
use url::Url;

/// Why a source URL could not be turned into an object location.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL has no bucket host")]
    MissingBucket,

    #[error("URL has no object key")]
    MissingKey,
}

/// A single object in a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parses a virtual-hosted style object URL.
    ///
    /// The bucket is the first label of the host, the key is the
    /// percent-decoded path without its leading slash:
    /// `https://bucket-x.example-store.com/in/clip.flac` is `bucket-x` / `in/clip.flac`.
    pub fn parse_url(raw: &str) -> Result<Self, LocationError> {
        let url = Url::parse(raw.trim()).map_err(|e| LocationError::InvalidUrl(e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(LocationError::UnsupportedScheme(other.to_string())),
        }

        let bucket = url
            .host_str()
            .and_then(|host| host.split('.').next())
            .filter(|label| !label.is_empty())
            .ok_or(LocationError::MissingBucket)?;

        let raw_key = url.path().trim_start_matches('/');
        let key = urlencoding::decode(raw_key)
            .map_err(|e| LocationError::InvalidUrl(e.to_string()))?
            .into_owned();
        if key.is_empty() || key.ends_with('/') {
            return Err(LocationError::MissingKey);
        }

        Ok(Self::new(bucket, key))
    }

    /// File extension of the key, if any.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.key)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
    }

    /// Externally addressable URI: `https://{bucket}.{host}/{key}`.
    pub fn public_uri(&self, host: &str) -> String {
        format!("https://{}.{}/{}", self.bucket, host, self.key)
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}
