use super::{types::Config, ConfigError, StorageBackend};

/// Codecs both separator backends can write.
const SUPPORTED_CODECS: &[&str] = &["mp3", "wav", "flac"];

/// Validate configuration
/// Currently validates:
/// - Storage section exists (enforced by serde)
/// - Server port is not 0
/// - Result bucket and region are set
/// - S3 backend has credentials
/// - Separator codec is one both backends understand
/// - Separator timeouts are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let storage = &config.storage;
    if storage.result_bucket.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.result_bucket cannot be empty".to_string(),
        ));
    }
    if storage.region.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.region cannot be empty".to_string(),
        ));
    }
    if storage.backend == StorageBackend::S3
        && (storage.access_key_id.is_empty() || storage.secret_access_key.is_empty())
    {
        return Err(ConfigError::ValidationError(
            "storage.access_key_id and storage.secret_access_key must be set for the s3 backend"
                .to_string(),
        ));
    }

    let codec = config.separator.codec.as_str();
    if !SUPPORTED_CODECS.contains(&codec) {
        return Err(ConfigError::ValidationError(format!(
            "separator.codec '{}' is not one of {:?}",
            codec, SUPPORTED_CODECS
        )));
    }

    if config.separator.spleeter.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "separator.spleeter.timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.separator.demucs.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "separator.demucs.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
