//! Job stages, requests and reports.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{JobError, ValidationError};
use crate::storage::ObjectLocation;

/// Phase of a job. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pending,
    Fetching,
    Separating,
    Publishing,
    CleaningUp,
    Succeeded,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Pending => "pending",
            Stage::Fetching => "fetching",
            Stage::Separating => "separating",
            Stage::Publishing => "publishing",
            Stage::CleaningUp => "cleaning_up",
            Stage::Succeeded => "succeeded",
            Stage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Succeeded | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a submit event: `{"url": "..."}`.
#[derive(Debug, Clone, Deserialize)]
struct SubmitBody {
    url: Option<String>,
}

/// A validated submit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub url: String,
    pub source: ObjectLocation,
}

impl SubmitRequest {
    /// Parses the raw event body.
    ///
    /// A missing body, non-JSON body or absent `url` is `MissingUrl`; a url
    /// that does not name a bucket and key is `InvalidUrl`.
    pub fn parse(body: Option<&str>) -> Result<Self, ValidationError> {
        let body = body.ok_or(ValidationError::MissingUrl)?;
        let parsed: SubmitBody =
            serde_json::from_str(body).map_err(|_| ValidationError::MissingUrl)?;
        let url = parsed
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or(ValidationError::MissingUrl)?;
        let source = ObjectLocation::parse_url(&url)?;

        Ok(Self { url, source })
    }
}

/// Public URIs of the published tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedTracks {
    pub vocals_url: String,
    pub accomp_url: String,
}

/// How a job ended.
#[derive(Debug)]
pub enum JobOutcome {
    Succeeded(PublishedTracks),
    Failed(JobError),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded(_))
    }

    pub fn error(&self) -> Option<&JobError> {
        match self {
            JobOutcome::Failed(e) => Some(e),
            JobOutcome::Succeeded(_) => None,
        }
    }
}

/// Result of handling one submit event.
#[derive(Debug)]
pub struct JobReport {
    /// `None` when the request was rejected before a job was created.
    pub job_id: Option<String>,
    /// Furthest stage reached.
    pub stage: Stage,
    pub outcome: JobOutcome,
    /// Status returned to the transport for the triggering event.
    pub status: u16,
}

impl JobReport {
    pub fn succeeded(job_id: String, tracks: PublishedTracks) -> Self {
        Self {
            job_id: Some(job_id),
            stage: Stage::Succeeded,
            outcome: JobOutcome::Succeeded(tracks),
            status: 200,
        }
    }

    pub fn failed(job_id: Option<String>, stage: Stage, error: JobError) -> Self {
        let status = error.status_code();
        Self {
            job_id,
            stage,
            outcome: JobOutcome::Failed(error),
            status,
        }
    }
}
