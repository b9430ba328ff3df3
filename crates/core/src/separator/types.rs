//! Types for the separator module.

use std::path::{Path, PathBuf};

use super::error::SeparationError;

/// One of the two tracks a separator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stem {
    Vocals,
    Accompaniment,
}

impl Stem {
    /// Key prefix of the published object.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Stem::Vocals => "vocals",
            Stem::Accompaniment => "accompaniment",
        }
    }
}

/// Local paths of the separated tracks. Owned by the caller once returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatedTracks {
    pub vocals: PathBuf,
    pub accompaniment: PathBuf,
}

impl SeparatedTracks {
    /// Tracks in publishing order.
    pub fn stems(&self) -> [(Stem, &Path); 2] {
        [
            (Stem::Vocals, self.vocals.as_path()),
            (Stem::Accompaniment, self.accompaniment.as_path()),
        ]
    }

    /// Fails with the first track that does not exist on disk.
    pub async fn ensure_present(&self) -> Result<(), SeparationError> {
        for (_, path) in self.stems() {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                return Err(SeparationError::MissingOutput {
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }
}

/// File stem of the input, used by both tools to name their output folder.
pub(crate) fn input_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "input".to_string())
}
