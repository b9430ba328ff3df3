//! Trait definitions for the separator module.

use async_trait::async_trait;
use std::path::Path;

use super::error::SeparationError;
use super::types::SeparatedTracks;

/// A backend that splits one audio file into vocals and accompaniment.
#[async_trait]
pub trait Separator: Send + Sync {
    /// Returns the name of this backend, as shown to clients.
    fn name(&self) -> &str;

    /// Separates `input` into tracks written under `output_dir`.
    ///
    /// The returned paths belong to the caller, which uploads and removes them.
    async fn separate(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<SeparatedTracks, SeparationError>;

    /// Validates that the backend's executable is available.
    async fn validate(&self) -> Result<(), SeparationError>;
}
