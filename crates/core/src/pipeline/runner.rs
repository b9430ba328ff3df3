//! The job pipeline: fetch, separate, publish, clean up.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::error::JobError;
use super::types::{JobReport, PublishedTracks, Stage, SubmitRequest};
use super::workspace::JobWorkspace;
use crate::config::{PipelineConfig, SourceRetention};
use crate::metrics;
use crate::notifier::{DeliveryError, Notification, Notifier};
use crate::separator::{Separator, Stem};
use crate::storage::{BlobStore, ObjectLocation};

const MSG_DOWNLOADING: &str = "Downloading audio file...";
const MSG_UPLOADING: &str = "Uploading to s3...";
const MSG_FINISHED: &str = "Finished splitting audio file";

/// Runs one job per submit event, start to finish.
///
/// Stages run strictly in sequence on the calling task. Every job that gets
/// past request parsing pushes `processing` events as it enters each stage
/// and exactly one terminal `success` or `error`.
pub struct JobPipeline {
    blob_store: Arc<dyn BlobStore>,
    separator: Arc<dyn Separator>,
    notifier: Arc<dyn Notifier>,
    config: PipelineConfig,
    result_bucket: String,
}

impl JobPipeline {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        separator: Arc<dyn Separator>,
        notifier: Arc<dyn Notifier>,
        config: PipelineConfig,
        result_bucket: impl Into<String>,
    ) -> Self {
        Self {
            blob_store,
            separator,
            notifier,
            config,
            result_bucket: result_bucket.into(),
        }
    }

    /// Name of the active separator backend.
    pub fn separator_name(&self) -> &str {
        self.separator.name()
    }

    /// Handles a submit event from `connection_id` carrying `body`.
    pub async fn run(&self, connection_id: &str, body: Option<&str>) -> JobReport {
        let mut job = Job::new(connection_id, self.notifier.as_ref());

        let request = match SubmitRequest::parse(body) {
            Ok(request) => request,
            Err(e) => {
                warn!(connection_id, error = %e, "Rejected submit request");
                let err = JobError::from(e);
                job.notify(Notification::error(err.client_message())).await;
                metrics::JOBS_TOTAL.with_label_values(&[err.kind()]).inc();
                return JobReport::failed(None, Stage::Pending, err);
            }
        };

        let span = info_span!("job", job_id = %job.id, connection_id);
        self.execute(job, request).instrument(span).await
    }

    async fn execute(&self, mut job: Job<'_>, request: SubmitRequest) -> JobReport {
        info!(source = %request.source, backend = self.separator.name(), "Starting job");

        job.advance(Stage::Fetching, true);
        job.notify(Notification::processing(MSG_DOWNLOADING)).await;

        let workspace = match JobWorkspace::create(
            &self.config.scratch_dir,
            &job.id,
            request.source.extension(),
        )
        .await
        {
            Ok(ws) => ws,
            Err(e) => {
                job.advance(Stage::CleaningUp, false);
                return self.finish(job, Err(JobError::Workspace(e))).await;
            }
        };

        let staged = self.run_stages(&mut job, &request, &workspace).await;

        job.advance(Stage::CleaningUp, staged.is_ok());
        workspace.release().await;

        let result = match staged {
            Ok(tracks) => self
                .dispose_source(&request.source)
                .await
                .map(|()| tracks),
            Err(e) => Err(e),
        };

        self.finish(job, result).await
    }

    /// Fetching, Separating and Publishing.
    async fn run_stages(
        &self,
        job: &mut Job<'_>,
        request: &SubmitRequest,
        workspace: &JobWorkspace,
    ) -> Result<PublishedTracks, JobError> {
        let bytes = self
            .blob_store
            .get(&request.source, workspace.source_path())
            .await
            .map_err(JobError::Fetch)?;
        debug!(bytes, path = %workspace.source_path().display(), "Fetched source");

        job.advance(Stage::Separating, true);
        let backend = self.separator.name();
        job.notify(Notification::processing(format!("Running {}...", backend)))
            .await;

        let separated = self
            .separator
            .separate(workspace.source_path(), workspace.stems_dir())
            .await;
        metrics::SEPARATIONS_TOTAL
            .with_label_values(&[backend, if separated.is_ok() { "ok" } else { "error" }])
            .inc();
        let tracks = separated?;

        job.advance(Stage::Publishing, true);
        job.notify(Notification::processing(MSG_UPLOADING)).await;

        let vocals_url = self.publish(Stem::Vocals, &tracks.vocals).await?;
        let accomp_url = self
            .publish(Stem::Accompaniment, &tracks.accompaniment)
            .await?;

        Ok(PublishedTracks {
            vocals_url,
            accomp_url,
        })
    }

    /// Uploads one track under a fresh key in the result bucket.
    async fn publish(&self, stem: Stem, track: &Path) -> Result<String, JobError> {
        let key = match track.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}/{}.{}", stem.key_prefix(), Uuid::new_v4(), ext),
            None => format!("{}/{}", stem.key_prefix(), Uuid::new_v4()),
        };
        let location = ObjectLocation::new(self.result_bucket.clone(), key);

        let uri = self
            .blob_store
            .put(&location, track)
            .await
            .map_err(JobError::Publish)?;
        info!(stem = stem.key_prefix(), uri = %uri, "Published track");
        Ok(uri)
    }

    /// Applies the source retention policy after a successful separation.
    async fn dispose_source(&self, source: &ObjectLocation) -> Result<(), JobError> {
        match self.config.source_retention {
            SourceRetention::Keep => Ok(()),
            SourceRetention::Delete => {
                info!(source = %source, "Deleting source object");
                if let Err(e) = self.blob_store.delete(source).await {
                    warn!(source = %source, error = %e, "Failed to delete source object");
                }
                Ok(())
            }
            SourceRetention::DeleteStrict => {
                info!(source = %source, "Deleting source object");
                self.blob_store
                    .delete(source)
                    .await
                    .map_err(JobError::SourceCleanup)
            }
        }
    }

    /// Pushes the terminal notification and builds the report.
    async fn finish(
        &self,
        mut job: Job<'_>,
        result: Result<PublishedTracks, JobError>,
    ) -> JobReport {
        match result {
            Ok(tracks) => {
                let data = serde_json::json!({
                    "vocals_url": &tracks.vocals_url,
                    "accomp_url": &tracks.accomp_url,
                });
                job.notify(Notification::success(MSG_FINISHED, data)).await;
                job.advance(Stage::Succeeded, true);

                match job.delivery_error.take() {
                    None => {
                        info!("Job succeeded");
                        metrics::JOBS_TOTAL.with_label_values(&["succeeded"]).inc();
                        JobReport::succeeded(job.id, tracks)
                    }
                    Some(e) => {
                        warn!(error = %e, "Job finished but the client missed notifications");
                        let err = JobError::Delivery(e);
                        metrics::JOBS_TOTAL.with_label_values(&[err.kind()]).inc();
                        JobReport::failed(Some(job.id), Stage::Succeeded, err)
                    }
                }
            }
            Err(err) => {
                let stage = job.failed_stage.unwrap_or(job.stage);
                error!(stage = %stage, error = %err, "Job failed");
                job.notify(Notification::error(err.client_message())).await;
                job.advance(Stage::Failed, false);
                metrics::JOBS_TOTAL.with_label_values(&[err.kind()]).inc();
                JobReport::failed(Some(job.id), Stage::Failed, err)
            }
        }
    }
}

/// Mutable state of one running job.
struct Job<'a> {
    id: String,
    connection_id: &'a str,
    notifier: &'a dyn Notifier,
    stage: Stage,
    stage_started: Instant,
    /// Stage that ended in error, if any.
    failed_stage: Option<Stage>,
    /// First push that failed; later failures are only logged.
    delivery_error: Option<DeliveryError>,
}

impl<'a> Job<'a> {
    fn new(connection_id: &'a str, notifier: &'a dyn Notifier) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            connection_id,
            notifier,
            stage: Stage::Pending,
            stage_started: Instant::now(),
            failed_stage: None,
            delivery_error: None,
        }
    }

    /// Moves to a later stage, recording how the current one went.
    fn advance(&mut self, next: Stage, ok: bool) {
        debug_assert!(next > self.stage, "stage moved backwards");

        if self.stage != Stage::Pending {
            metrics::STAGE_DURATION
                .with_label_values(&[self.stage.as_str(), if ok { "ok" } else { "error" }])
                .observe(self.stage_started.elapsed().as_secs_f64());
        }
        if !ok && self.failed_stage.is_none() {
            self.failed_stage = Some(self.stage);
        }
        debug!(from = %self.stage, to = %next, "Stage transition");

        self.stage = next;
        self.stage_started = Instant::now();
    }

    async fn notify(&mut self, notification: Notification) {
        let status = notification.status.as_str();
        match self.notifier.send(self.connection_id, &notification).await {
            Ok(()) => {
                metrics::NOTIFICATIONS_TOTAL
                    .with_label_values(&[status, "delivered"])
                    .inc();
            }
            Err(e) => {
                metrics::NOTIFICATIONS_TOTAL
                    .with_label_values(&[status, "failed"])
                    .inc();
                warn!(
                    connection_id = self.connection_id,
                    status,
                    error = %e,
                    "Failed to deliver notification"
                );
                if self.delivery_error.is_none() {
                    self.delivery_error = Some(e);
                }
            }
        }
    }
}
