//! Demucs-based separator: model-driven two-stem split run as a subprocess.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use super::error::SeparationError;
use super::process::{probe_tool, run_tool};
use super::traits::Separator;
use super::types::{input_stem, SeparatedTracks};
use crate::config::DemucsConfig;

/// Heavy backend driving `python -m demucs.separate`.
pub struct DemucsSeparator {
    config: DemucsConfig,
    codec: String,
}

impl DemucsSeparator {
    pub fn new(config: DemucsConfig, codec: impl Into<String>) -> Self {
        Self {
            config,
            codec: codec.into(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DemucsConfig::default(), "mp3")
    }

    fn build_args(&self, input: &Path, output_dir: &Path) -> Vec<String> {
        let mut args = vec!["-m".to_string(), "demucs.separate".to_string()];

        // wav is demucs' native output and takes no flag
        match self.codec.as_str() {
            "mp3" => args.push("--mp3".to_string()),
            "flac" => args.push("--flac".to_string()),
            _ => {}
        }

        args.extend([
            "--two-stems".to_string(),
            "vocals".to_string(),
            "-n".to_string(),
            self.config.model.clone(),
            "-o".to_string(),
            output_dir.to_string_lossy().to_string(),
            input.to_string_lossy().to_string(),
        ]);
        args
    }

    /// Demucs writes `<output_dir>/<model>/<input stem>/{vocals,no_vocals}.<ext>`.
    fn expected_tracks(&self, input: &Path, output_dir: &Path) -> SeparatedTracks {
        let folder = output_dir
            .join(&self.config.model)
            .join(input_stem(input));
        SeparatedTracks {
            vocals: folder.join(format!("vocals.{}", self.codec)),
            accompaniment: folder.join(format!("no_vocals.{}", self.codec)),
        }
    }
}

#[async_trait]
impl Separator for DemucsSeparator {
    fn name(&self) -> &str {
        "demucs"
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

        info!(input = %input.display(), model = %self.config.model, "Running demucs");
        let args = self.build_args(input, output_dir);
        run_tool("demucs", &self.config.python, &args, self.config.timeout_secs).await?;

        let tracks = self.expected_tracks(input, output_dir);
        tracks.ensure_present().await?;
        Ok(tracks)
    }

    async fn validate(&self) -> Result<(), SeparationError> {
        probe_tool(&self.config.python, &["-c", "import demucs"]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_args_mp3() {
        let separator = DemucsSeparator::with_defaults();
        let args = separator.build_args(Path::new("/tmp/in.flac"), Path::new("/tmp/out"));
        assert_eq!(
            args,
            vec![
                "-m",
                "demucs.separate",
                "--mp3",
                "--two-stems",
                "vocals",
                "-n",
                "htdemucs",
                "-o",
                "/tmp/out",
                "/tmp/in.flac",
            ]
        );
    }

    #[test]
    fn test_build_args_wav_has_no_codec_flag() {
        let separator = DemucsSeparator::new(DemucsConfig::default(), "wav");
        let args = separator.build_args(Path::new("/tmp/in.flac"), Path::new("/tmp/out"));
        assert!(!args.iter().any(|a| a == "--mp3" || a == "--flac"));
    }

    #[test]
    fn test_expected_tracks_layout() {
        let separator = DemucsSeparator::with_defaults();
        let tracks = separator.expected_tracks(Path::new("/tmp/in.flac"), Path::new("/tmp/out"));
        assert_eq!(tracks.vocals, PathBuf::from("/tmp/out/htdemucs/in/vocals.mp3"));
        assert_eq!(
            tracks.accompaniment,
            PathBuf::from("/tmp/out/htdemucs/in/no_vocals.mp3")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_separate_missing_outputs_is_error() {
        // `true` exits 0 without writing anything
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("clip.flac");
        std::fs::write(&input, b"flac").unwrap();

        let config = DemucsConfig {
            python: PathBuf::from("true"),
            ..Default::default()
        };
        let separator = DemucsSeparator::new(config, "mp3");
        let result = separator.separate(&input, &dir.path().join("out")).await;
        assert!(matches!(result, Err(SeparationError::MissingOutput { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_separate_failing_process() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("clip.flac");
        std::fs::write(&input, b"flac").unwrap();

        let config = DemucsConfig {
            python: PathBuf::from("false"),
            ..Default::default()
        };
        let separator = DemucsSeparator::new(config, "mp3");
        let result = separator.separate(&input, &dir.path().join("out")).await;
        assert!(matches!(result, Err(SeparationError::ProcessFailed { .. })));
    }
}
