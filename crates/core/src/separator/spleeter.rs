//! Spleeter-based separator: fixed two-stem split with a hard time ceiling.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use super::error::SeparationError;
use super::process::{probe_tool, run_tool};
use super::traits::Separator;
use super::types::{input_stem, SeparatedTracks};
use crate::config::SpleeterConfig;

/// Fast default backend driving the `spleeter` CLI.
pub struct SpleeterSeparator {
    config: SpleeterConfig,
    codec: String,
}

impl SpleeterSeparator {
    pub fn new(config: SpleeterConfig, codec: impl Into<String>) -> Self {
        Self {
            config,
            codec: codec.into(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(SpleeterConfig::default(), "mp3")
    }

    fn build_args(&self, input: &Path, output_dir: &Path) -> Vec<String> {
        vec![
            "separate".to_string(),
            "-p".to_string(),
            self.config.model.clone(),
            "-c".to_string(),
            self.codec.clone(),
            "-o".to_string(),
            output_dir.to_string_lossy().to_string(),
            input.to_string_lossy().to_string(),
        ]
    }

    /// Spleeter writes `<output_dir>/<input stem>/{vocals,accompaniment}.<codec>`.
    fn expected_tracks(&self, input: &Path, output_dir: &Path) -> SeparatedTracks {
        let folder = output_dir.join(input_stem(input));
        SeparatedTracks {
            vocals: folder.join(format!("vocals.{}", self.codec)),
            accompaniment: folder.join(format!("accompaniment.{}", self.codec)),
        }
    }
}

#[async_trait]
impl Separator for SpleeterSeparator {
    fn name(&self) -> &str {
        "spleeter"
    }

    async fn separate(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<SeparatedTracks, SeparationError> {
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(SeparationError::InputNotFound {
                path: input.to_path_buf(),
            });
        }
        tokio::fs::create_dir_all(output_dir).await.map_err(|_| {
            SeparationError::OutputDirectoryFailed {
                path: output_dir.to_path_buf(),
            }
        })?;

        info!(input = %input.display(), model = %self.config.model, "Running spleeter");
        let args = self.build_args(input, output_dir);
        run_tool(
            "spleeter",
            &self.config.binary,
            &args,
            Some(self.config.timeout_secs),
        )
        .await?;

        let tracks = self.expected_tracks(input, output_dir);
        tracks.ensure_present().await?;
        Ok(tracks)
    }

    async fn validate(&self) -> Result<(), SeparationError> {
        probe_tool(&self.config.binary, &["--version"]).await
    }
}
