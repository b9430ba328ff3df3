//! Error types for the separator module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while separating a track.
#[derive(Debug, Error)]
pub enum SeparationError {
    /// Separator executable not found.
    #[error("Separator executable not found: {path}")]
    ToolNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Output directory could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// The separator process exited unsuccessfully.
    #[error("{tool} exited with code {code:?}")]
    ProcessFailed {
        tool: String,
        code: Option<i32>,
        output: Option<String>,
    },

    /// The separator ran past its ceiling and was killed.
    #[error("Separation timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The process succeeded but an expected track is missing.
    #[error("Expected output not produced: {path}")]
    MissingOutput { path: PathBuf },

    /// I/O error while driving the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeparationError {
    /// Creates a process failure error with captured output.
    pub fn process_failed(tool: impl Into<String>, code: Option<i32>, output: String) -> Self {
        Self::ProcessFailed {
            tool: tool.into(),
            code,
            output: if output.is_empty() {
                None
            } else {
                Some(output)
            },
        }
    }
}
