//! Separator backends for splitting a track into vocals and accompaniment.
//!
//! Two interchangeable implementations exist:
//!
//! - [`SpleeterSeparator`]: fixed `spleeter:2stems` split, bounded by a timeout
//! - [`DemucsSeparator`]: model-based split via `python -m demucs.separate`
//!
//! Exactly one is active per process, chosen from configuration at startup.
//!
//! # Example
//!
//! ```ignore
//! use stemsplit_core::separator::{create_separator, Separator};
//!
//! let separator = create_separator(&config.separator);
//! separator.validate().await?;
//!
//! let tracks = separator.separate(Path::new("/tmp/job/source.flac"), Path::new("/tmp/job/stems")).await?;
//! println!("vocals at {}", tracks.vocals.display());
//! ```

mod demucs;
mod error;
mod process;
mod spleeter;
mod traits;
mod types;

pub use demucs::DemucsSeparator;
pub use error::SeparationError;
pub use spleeter::SpleeterSeparator;
pub use traits::Separator;
pub use types::{SeparatedTracks, Stem};

use crate::config::{SeparatorBackend, SeparatorConfig};

/// Factory function to create the configured separator backend
pub fn create_separator(config: &SeparatorConfig) -> Box<dyn Separator> {
    match config.backend {
        SeparatorBackend::Spleeter => Box::new(SpleeterSeparator::new(
            config.spleeter.clone(),
            config.codec.clone(),
        )),
        SeparatorBackend::Demucs => Box::new(DemucsSeparator::new(
            config.demucs.clone(),
            config.codec.clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_separator_default_is_spleeter() {
        let separator = create_separator(&SeparatorConfig::default());
        assert_eq!(separator.name(), "spleeter");
    }

    #[test]
    fn test_create_separator_demucs() {
        let config = SeparatorConfig {
            backend: SeparatorBackend::Demucs,
            ..Default::default()
        };
        let separator = create_separator(&config);
        assert_eq!(separator.name(), "demucs");
    }
}
