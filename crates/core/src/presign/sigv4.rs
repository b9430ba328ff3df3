//! AWS Signature Version 4 query-string presigning for S3.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::time::Duration;
use url::Url;

use super::types::{PresignAction, PresignError};
use super::Presigner;
use crate::config::StorageConfig;
use crate::storage::ObjectLocation;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
/// S3 refuses presigned URLs valid for longer than seven days.
const MAX_EXPIRY_SECS: u64 = 7 * 24 * 3600;

/// Access key pair used for signing.
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Where signed requests are sent.
#[derive(Debug, Clone)]
pub enum S3Endpoint {
    /// `https://{bucket}.{host_suffix}/{key}`
    VirtualHosted { host_suffix: String },
    /// `{base_url}/{bucket}/{key}`, used for S3-compatible stores.
    PathStyle { base_url: Url },
}

impl S3Endpoint {
    /// Returns `(scheme, host header, canonical URI)` for an object.
    fn resolve(&self, location: &ObjectLocation) -> Result<(String, String, String), PresignError> {
        let encoded_key = encode_key(&location.key);
        match self {
            S3Endpoint::VirtualHosted { host_suffix } => Ok((
                "https".to_string(),
                format!("{}.{}", location.bucket, host_suffix),
                format!("/{}", encoded_key),
            )),
            S3Endpoint::PathStyle { base_url } => {
                let host = base_url
                    .host_str()
                    .ok_or_else(|| PresignError::InvalidEndpoint(base_url.to_string()))?;
                let host = match base_url.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                };
                let prefix = base_url.path().trim_end_matches('/');
                Ok((
                    base_url.scheme().to_string(),
                    host,
                    format!(
                        "{}/{}/{}",
                        prefix,
                        uri_encode(&location.bucket),
                        encoded_key
                    ),
                ))
            }
        }
    }
}

/// Issues SigV4 presigned URLs with `UNSIGNED-PAYLOAD`.
#[derive(Debug, Clone)]
pub struct SigV4Presigner {
    credentials: Credentials,
    region: String,
    endpoint: S3Endpoint,
}

impl SigV4Presigner {
    pub fn new(credentials: Credentials, region: impl Into<String>, endpoint: S3Endpoint) -> Self {
        Self {
            credentials,
            region: region.into(),
            endpoint,
        }
    }

    /// Builds a presigner from storage settings.
    ///
    /// Uses path-style addressing against `endpoint` when set, otherwise the
    /// regional AWS host.
    pub fn from_config(config: &StorageConfig) -> Result<Self, PresignError> {
        let endpoint = match &config.endpoint {
            Some(raw) => S3Endpoint::PathStyle {
                base_url: Url::parse(raw)
                    .map_err(|e| PresignError::InvalidEndpoint(format!("{}: {}", raw, e)))?,
            },
            None => S3Endpoint::VirtualHosted {
                host_suffix: format!("s3.{}.amazonaws.com", config.region),
            },
        };

        Ok(Self::new(
            Credentials {
                access_key_id: config.access_key_id.clone(),
                secret_access_key: config.secret_access_key.clone(),
            },
            config.region.clone(),
            endpoint,
        ))
    }

    /// Presigns at an explicit instant.
    pub fn presign_at(
        &self,
        location: &ObjectLocation,
        action: PresignAction,
        expires_in: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, PresignError> {
        let (scheme, host, canonical_uri) = self.endpoint.resolve(location)?;
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/{}/aws4_request", date, self.region, SERVICE);
        let expires = expires_in.as_secs().clamp(1, MAX_EXPIRY_SECS);

        // Already sorted by key
        let query_params = [
            ("X-Amz-Algorithm", ALGORITHM.to_string()),
            (
                "X-Amz-Credential",
                format!("{}/{}", self.credentials.access_key_id, scope),
            ),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", expires.to_string()),
            ("X-Amz-SignedHeaders", "host".to_string()),
        ];
        let canonical_query = query_params
            .iter()
            .map(|(k, v)| format!("{}={}", uri_encode(k), uri_encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request = format!(
            "{}\n{}\n{}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
            action.http_method(),
            canonical_uri,
            canonical_query,
            host
        );

        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = self.signing_key(&date)?;
        let signature = hex::encode(hmac(&signing_key, string_to_sign.as_bytes())?);

        Ok(format!(
            "{}://{}{}?{}&X-Amz-Signature={}",
            scheme, host, canonical_uri, canonical_query, signature
        ))
    }

    fn signing_key(&self, date: &str) -> Result<Vec<u8>, PresignError> {
        let secret = format!("AWS4{}", self.credentials.secret_access_key);
        let k_date = hmac(secret.as_bytes(), date.as_bytes())?;
        let k_region = hmac(&k_date, self.region.as_bytes())?;
        let k_service = hmac(&k_region, SERVICE.as_bytes())?;
        hmac(&k_service, b"aws4_request")
    }
}

impl Presigner for SigV4Presigner {
    fn presign(
        &self,
        location: &ObjectLocation,
        action: PresignAction,
        expires_in: Duration,
    ) -> Result<String, PresignError> {
        self.presign_at(location, action, expires_in, Utc::now())
    }
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, PresignError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| PresignError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// RFC 3986 encoding of everything but unreserved characters.
fn uri_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Encodes each path segment of a key, keeping the slashes.
fn encode_key(key: &str) -> String {
    key.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}
