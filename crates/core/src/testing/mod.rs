//! Testing utilities and mock implementations.
//!
//! Mocks for every collaborator of the job pipeline and the dispatcher, so
//! the full event flow can be exercised without storage, separator binaries
//! or sockets.
//!
//! # Example
//!
//! ```rust,ignore
//! use stemsplit_core::testing::{MockBlobStore, MockNotifier, MockSeparator};
//!
//! let store = MockBlobStore::new();
//! store.insert(ObjectLocation::new("bucket-x", "in/clip.flac"), b"fLaC".to_vec()).await;
//!
//! let separator = MockSeparator::new();
//! separator.set_next_error(SeparationError::Timeout { timeout_secs: 1 }).await;
//!
//! // Build a JobPipeline from the mocks, run it, then inspect
//! // notifier.messages_for("conn-1").await
//! ```

mod mock_blob_store;
mod mock_notifier;
mod mock_registry;
mod mock_separator;

pub use mock_blob_store::{BlobOperation, MockBlobStore};
pub use mock_notifier::{MockNotifier, SentNotification};
pub use mock_registry::{MockRegistry, RegistryCall};
pub use mock_separator::{MockSeparator, RecordedSeparation};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::config::{PipelineConfig, SourceRetention};

    /// Source URL used by most scenarios.
    pub const SOURCE_URL: &str = "https://bucket-x.example-store.com/in/clip.flac";

    /// A submit body for `url`.
    pub fn submit_body(url: &str) -> String {
        serde_json::json!({ "url": url }).to_string()
    }

    /// Pipeline settings with scratch space under `scratch_dir`.
    pub fn pipeline_config(scratch_dir: &Path, retention: SourceRetention) -> PipelineConfig {
        PipelineConfig {
            scratch_dir: scratch_dir.to_path_buf(),
            source_retention: retention,
        }
    }
}
