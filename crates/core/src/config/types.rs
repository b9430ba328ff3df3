use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub separator: SeparatorConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Connection registry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub backend: RegistryBackend,
    /// SQLite database path (sqlite backend only)
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: RegistryBackend::default(),
            path: default_registry_path(),
        }
    }
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("stemsplit.db")
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RegistryBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Blob storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Region used for signing and for the default storage host
    #[serde(default = "default_region")]
    pub region: String,
    /// Bucket that receives the separated tracks
    pub result_bucket: String,
    /// Host part of public object URIs (`https://{bucket}.{storage_host}/{key}`).
    /// Defaults to `s3.{region}.amazonaws.com`.
    #[serde(default)]
    pub storage_host: Option<String>,
    /// Base URL override for S3-compatible stores (e.g. "http://localhost:9000").
    /// When set, requests use path-style addressing against this endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    /// Lifetime of issued presigned URLs
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry_secs: u64,
    /// Timeout for a single storage request, covering the whole transfer
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Root directory for the filesystem backend, one subdirectory per bucket
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl StorageConfig {
    /// Host used when building public object URIs.
    pub fn public_host(&self) -> String {
        self.storage_host
            .clone()
            .unwrap_or_else(|| format!("s3.{}.amazonaws.com", self.region))
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_presign_expiry() -> u64 {
    3600
}

fn default_request_timeout() -> u64 {
    300
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("blobs")
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    S3,
    Filesystem,
}

/// Job pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Directory holding per-job scratch directories
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    /// What happens to the source object once the tracks are published
    #[serde(default)]
    pub source_retention: SourceRetention,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            source_retention: SourceRetention::default(),
        }
    }
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("stemsplit")
}

/// Policy for the source object after a successful separation.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceRetention {
    /// Leave the source object in place.
    #[default]
    Keep,
    /// Delete the source object; failures are logged only.
    Delete,
    /// Delete the source object; a failure fails the job.
    DeleteStrict,
}

/// Separator backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeparatorConfig {
    #[serde(default)]
    pub backend: SeparatorBackend,
    /// Output codec of the separated tracks (file extension as well)
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default)]
    pub spleeter: SpleeterConfig,
    #[serde(default)]
    pub demucs: DemucsConfig,
}

impl Default for SeparatorConfig {
    fn default() -> Self {
        Self {
            backend: SeparatorBackend::default(),
            codec: default_codec(),
            spleeter: SpleeterConfig::default(),
            demucs: DemucsConfig::default(),
        }
    }
}

fn default_codec() -> String {
    "mp3".to_string()
}

/// Available separator backends
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeparatorBackend {
    #[default]
    Spleeter,
    Demucs,
}

impl SeparatorBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeparatorBackend::Spleeter => "spleeter",
            SeparatorBackend::Demucs => "demucs",
        }
    }
}

/// Spleeter (fast two-stem) settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpleeterConfig {
    #[serde(default = "default_spleeter_binary")]
    pub binary: PathBuf,
    #[serde(default = "default_spleeter_model")]
    pub model: String,
    /// Hard ceiling on a single separation run
    #[serde(default = "default_spleeter_timeout")]
    pub timeout_secs: u64,
}

impl Default for SpleeterConfig {
    fn default() -> Self {
        Self {
            binary: default_spleeter_binary(),
            model: default_spleeter_model(),
            timeout_secs: default_spleeter_timeout(),
        }
    }
}

fn default_spleeter_binary() -> PathBuf {
    PathBuf::from("spleeter")
}

fn default_spleeter_model() -> String {
    "spleeter:2stems".to_string()
}

fn default_spleeter_timeout() -> u64 {
    600
}

/// Demucs (model-based) settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemucsConfig {
    #[serde(default = "default_python")]
    pub python: PathBuf,
    #[serde(default = "default_demucs_model")]
    pub model: String,
    /// Optional ceiling; demucs runs unbounded when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for DemucsConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            model: default_demucs_model(),
            timeout_secs: None,
        }
    }
}

fn default_python() -> PathBuf {
    PathBuf::from("python3")
}

fn default_demucs_model() -> String {
    "htdemucs".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub storage: SanitizedStorageConfig,
    pub pipeline: PipelineConfig,
    pub separator: SeparatorConfig,
}

/// Sanitized storage config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub backend: StorageBackend,
    pub region: String,
    pub result_bucket: String,
    pub public_host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub credentials_configured: bool,
    pub presign_expiry_secs: u64,
    pub request_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let storage = &config.storage;
        Self {
            server: config.server.clone(),
            registry: config.registry.clone(),
            storage: SanitizedStorageConfig {
                backend: storage.backend,
                region: storage.region.clone(),
                result_bucket: storage.result_bucket.clone(),
                public_host: storage.public_host(),
                endpoint: storage.endpoint.clone(),
                credentials_configured: !storage.access_key_id.is_empty()
                    && !storage.secret_access_key.is_empty(),
                presign_expiry_secs: storage.presign_expiry_secs,
                request_timeout_secs: storage.request_timeout_secs,
            },
            pipeline: config.pipeline.clone(),
            separator: config.separator.clone(),
        }
    }
}
