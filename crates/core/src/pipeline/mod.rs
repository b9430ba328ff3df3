//! Job pipeline: turns a submit event into separated, published tracks.
//!
//! A job moves through
//! `Pending → Fetching → Separating → Publishing → CleaningUp → Succeeded | Failed`
//! and never re-enters a stage. On failure the remaining stages are skipped,
//! the scratch workspace is still released and exactly one `error`
//! notification is pushed.
//!
//! ```ignore
//! let pipeline = JobPipeline::new(blob_store, separator, notifier, config.pipeline, bucket);
//! let report = pipeline.run("conn-1", Some(r#"{"url": "https://in.s3.amazonaws.com/a.flac"}"#)).await;
//! assert_eq!(report.status, 200);
//! ```

mod error;
mod runner;
mod types;
mod workspace;

pub use error::{JobError, ValidationError};
pub use runner::JobPipeline;
pub use types::{JobOutcome, JobReport, PublishedTracks, Stage, SubmitRequest};
pub use workspace::JobWorkspace;
