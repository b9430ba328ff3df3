//! Mock separator for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::separator::{SeparatedTracks, SeparationError, Separator};

/// A recorded separation for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSeparation {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub success: bool,
}

/// Mock implementation of the Separator trait.
///
/// Writes small placeholder tracks named like spleeter's output
/// (`vocals.<codec>`, `accompaniment.<codec>`) into the output directory.
#[derive(Debug)]
pub struct MockSeparator {
    name: String,
    codec: String,
    separations: Arc<RwLock<Vec<RecordedSeparation>>>,
    next_error: Arc<RwLock<Option<SeparationError>>>,
    missing_tool: Arc<RwLock<Option<PathBuf>>>,
}

impl Default for MockSeparator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSeparator {
    /// A mock that reports itself as `spleeter` and writes mp3 files.
    pub fn new() -> Self {
        Self::named("spleeter", "mp3")
    }

    pub fn named(name: impl Into<String>, codec: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            codec: codec.into(),
            separations: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            missing_tool: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn recorded_separations(&self) -> Vec<RecordedSeparation> {
        self.separations.read().await.clone()
    }

    pub async fn separation_count(&self) -> usize {
        self.separations.read().await.len()
    }

    /// The next `separate` call fails with this error.
    pub async fn set_next_error(&self, error: SeparationError) {
        *self.next_error.write().await = Some(error);
    }

    /// `validate` reports this executable as missing until cleared.
    pub async fn set_missing_tool(&self, path: Option<PathBuf>) {
        *self.missing_tool.write().await = path;
    }
}

#[async_trait]
impl Separator for MockSeparator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn separate(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<SeparatedTracks, SeparationError> {
        let result = self.write_tracks(input, output_dir).await;

        self.separations.write().await.push(RecordedSeparation {
            input: input.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            success: result.is_ok(),
        });
        result
    }

    async fn validate(&self) -> Result<(), SeparationError> {
        match self.missing_tool.read().await.clone() {
            Some(path) => Err(SeparationError::ToolNotFound { path }),
            None => Ok(()),
        }
    }
}

impl MockSeparator {
    async fn write_tracks(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<SeparatedTracks, SeparationError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if !input.exists() {
            return Err(SeparationError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        tokio::fs::create_dir_all(output_dir).await?;
        let tracks = SeparatedTracks {
            vocals: output_dir.join(format!("vocals.{}", self.codec)),
            accompaniment: output_dir.join(format!("accompaniment.{}", self.codec)),
        };
        tokio::fs::write(&tracks.vocals, b"mock vocals").await?;
        tokio::fs::write(&tracks.accompaniment, b"mock accompaniment").await?;
        Ok(tracks)
    }
}
