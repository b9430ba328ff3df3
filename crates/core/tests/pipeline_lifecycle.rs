//! Job pipeline lifecycle integration tests.
//!
//! These tests run the pipeline against mock storage, separator and notifier:
//! - Notification order for a successful job
//! - One terminal notification per job on every failure path
//! - Scratch workspace release regardless of outcome
//! - Source retention policies
//! - Delivery failures turning a finished job into a failed report

use std::sync::Arc;

use tempfile::TempDir;

use stemsplit_core::{
    config::SourceRetention,
    notifier::NotificationStatus,
    pipeline::{JobError, JobOutcome, JobPipeline, Stage, ValidationError},
    separator::SeparationError,
    storage::{ObjectLocation, StorageError},
    testing::{fixtures, BlobOperation, MockBlobStore, MockNotifier, MockSeparator},
};

const CONN: &str = "conn-1";
const RESULT_BUCKET: &str = "stems-out";

/// Test helper holding the pipeline and handles to its mocks.
struct TestHarness {
    pipeline: JobPipeline,
    store: Arc<MockBlobStore>,
    separator: Arc<MockSeparator>,
    notifier: Arc<MockNotifier>,
    scratch: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        Self::with_retention(SourceRetention::Keep).await
    }

    async fn with_retention(retention: SourceRetention) -> Self {
        let scratch = TempDir::new().expect("Failed to create scratch dir");
        let store = Arc::new(MockBlobStore::new());
        let separator = Arc::new(MockSeparator::new());
        let notifier = Arc::new(MockNotifier::new());

        store
            .insert(ObjectLocation::new("bucket-x", "in/clip.flac"), b"fLaC".to_vec())
            .await;

        let pipeline = JobPipeline::new(
            store.clone(),
            separator.clone(),
            notifier.clone(),
            fixtures::pipeline_config(scratch.path(), retention),
            RESULT_BUCKET,
        );

        Self {
            pipeline,
            store,
            separator,
            notifier,
            scratch,
        }
    }

    async fn submit(&self, body: Option<&str>) -> stemsplit_core::JobReport {
        self.pipeline.run(CONN, body).await
    }

    async fn submit_default(&self) -> stemsplit_core::JobReport {
        let body = fixtures::submit_body(fixtures::SOURCE_URL);
        self.submit(Some(&body)).await
    }

    async fn messages(&self) -> Vec<(NotificationStatus, String)> {
        self.notifier.messages_for(CONN).await
    }

    /// Number of entries left in the scratch directory.
    fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.scratch.path())
            .expect("scratch dir readable")
            .count()
    }
}

fn processing(msg: &str) -> (NotificationStatus, String) {
    (NotificationStatus::Processing, msg.to_string())
}

fn error(msg: &str) -> (NotificationStatus, String) {
    (NotificationStatus::Error, msg.to_string())
}

#[tokio::test]
async fn test_successful_job_notification_sequence() {
    let harness = TestHarness::new().await;

    let report = harness.submit_default().await;

    assert_eq!(report.status, 200);
    assert_eq!(report.stage, Stage::Succeeded);
    assert!(report.job_id.is_some());

    let notifications = harness.notifier.notifications_for(CONN).await;
    assert_eq!(notifications.len(), 4);
    assert_eq!(
        notifications[..3]
            .iter()
            .map(|n| (n.status, n.message.clone()))
            .collect::<Vec<_>>(),
        vec![
            processing("Downloading audio file..."),
            processing("Running spleeter..."),
            processing("Uploading to s3..."),
        ]
    );

    let terminal = &notifications[3];
    assert_eq!(terminal.status, NotificationStatus::Success);
    assert_eq!(terminal.message, "Finished splitting audio file");

    let data = terminal.data.as_ref().expect("success carries data");
    let vocals = data["vocals_url"].as_str().unwrap();
    let accomp = data["accomp_url"].as_str().unwrap();
    assert!(vocals.starts_with("https://stems-out.s3.us-east-1.amazonaws.com/vocals/"));
    assert!(vocals.ends_with(".mp3"));
    assert!(accomp.starts_with("https://stems-out.s3.us-east-1.amazonaws.com/accompaniment/"));
    assert_ne!(vocals, accomp);
}

#[tokio::test]
async fn test_successful_job_publishes_both_tracks() {
    let harness = TestHarness::new().await;

    let report = harness.submit_default().await;

    let keys = harness.store.keys_in(RESULT_BUCKET).await;
    assert_eq!(keys.len(), 2);
    assert!(keys[0].starts_with("accompaniment/"));
    assert!(keys[1].starts_with("vocals/"));

    match report.outcome {
        JobOutcome::Succeeded(tracks) => {
            assert!(tracks.vocals_url.ends_with(&keys[1]));
            assert!(tracks.accomp_url.ends_with(&keys[0]));
        }
        JobOutcome::Failed(e) => panic!("job failed: {e}"),
    }
}

#[tokio::test]
async fn test_separator_receives_scoped_workspace() {
    let harness = TestHarness::new().await;

    let report = harness.submit_default().await;
    let job_id = report.job_id.unwrap();

    let runs = harness.separator.recorded_separations().await;
    assert_eq!(runs.len(), 1);
    assert_eq!(
        runs[0].input,
        harness.scratch.path().join(&job_id).join("source.flac")
    );
    assert_eq!(
        runs[0].output_dir,
        harness.scratch.path().join(&job_id).join("stems")
    );

    // Workspace released after success
    assert_eq!(harness.scratch_entries(), 0);
}

#[tokio::test]
async fn test_missing_url_rejected_without_fetch() {
    let harness = TestHarness::new().await;

    let report = harness.submit(Some(r#"{"link": "nope"}"#)).await;

    assert_eq!(report.status, 400);
    assert_eq!(report.stage, Stage::Pending);
    assert!(report.job_id.is_none());
    assert!(matches!(
        report.outcome.error(),
        Some(JobError::Validation(ValidationError::MissingUrl))
    ));
    assert_eq!(harness.messages().await, vec![error("No url provided")]);
    assert!(harness.store.operations().await.is_empty());
}

#[tokio::test]
async fn test_unparseable_body() {
    let harness = TestHarness::new().await;

    let report = harness.submit(Some("this is not json")).await;

    assert_eq!(report.status, 400);
    assert_eq!(harness.messages().await, vec![error("No url provided")]);
    assert_eq!(harness.separator.separation_count().await, 0);
}

#[tokio::test]
async fn test_missing_body() {
    let harness = TestHarness::new().await;

    let report = harness.submit(None).await;

    assert_eq!(report.status, 400);
    assert_eq!(harness.messages().await, vec![error("No url provided")]);
}

#[tokio::test]
async fn test_fetch_failure() {
    let harness = TestHarness::new().await;
    let body = fixtures::submit_body("https://bucket-x.example-store.com/in/missing.wav");

    let report = harness.submit(Some(&body)).await;

    assert_eq!(report.status, 500);
    assert_eq!(report.stage, Stage::Failed);
    assert!(matches!(report.outcome.error(), Some(JobError::Fetch(_))));
    assert_eq!(
        harness.messages().await,
        vec![
            processing("Downloading audio file..."),
            error("Error downloading audio file"),
        ]
    );
    assert_eq!(harness.separator.separation_count().await, 0);
    assert_eq!(harness.scratch_entries(), 0);
}

#[tokio::test]
async fn test_unusable_scratch_dir_fails_before_fetch() {
    let dir = TempDir::new().unwrap();
    let scratch_file = dir.path().join("not-a-dir");
    std::fs::write(&scratch_file, b"occupied").unwrap();

    let store = Arc::new(MockBlobStore::new());
    let separator = Arc::new(MockSeparator::new());
    let notifier = Arc::new(MockNotifier::new());
    let pipeline = JobPipeline::new(
        store.clone(),
        separator.clone(),
        notifier.clone(),
        fixtures::pipeline_config(&scratch_file, SourceRetention::Keep),
        RESULT_BUCKET,
    );

    let body = fixtures::submit_body(fixtures::SOURCE_URL);
    let report = pipeline.run(CONN, Some(&body)).await;

    assert_eq!(report.status, 500);
    assert_eq!(report.stage, Stage::Failed);
    assert!(matches!(report.outcome.error(), Some(JobError::Workspace(_))));
    assert_eq!(
        notifier.messages_for(CONN).await,
        vec![
            processing("Downloading audio file..."),
            error("Error downloading audio file"),
        ]
    );
    assert!(store.operations().await.is_empty());
    assert_eq!(separator.separation_count().await, 0);
}

#[tokio::test]
async fn test_separation_failure_skips_publishing() {
    let harness = TestHarness::new().await;
    harness
        .separator
        .set_next_error(SeparationError::Timeout { timeout_secs: 600 })
        .await;

    let report = harness.submit_default().await;

    assert_eq!(report.status, 500);
    assert!(matches!(
        report.outcome.error(),
        Some(JobError::Separation(SeparationError::Timeout { .. }))
    ));
    assert_eq!(
        harness.messages().await,
        vec![
            processing("Downloading audio file..."),
            processing("Running spleeter..."),
            error("Error splitting audio file"),
        ]
    );
    assert_eq!(harness.store.put_count().await, 0);
    assert_eq!(harness.scratch_entries(), 0);
}

#[tokio::test]
async fn test_publish_failure() {
    let harness = TestHarness::new().await;
    harness
        .store
        .set_next_put_error(StorageError::Http {
            status: 503,
            message: "SlowDown".to_string(),
        })
        .await;

    let report = harness.submit_default().await;

    assert_eq!(report.status, 500);
    assert!(matches!(report.outcome.error(), Some(JobError::Publish(_))));
    let messages = harness.messages().await;
    assert_eq!(messages.last(), Some(&error("Error uploading audio files")));
    assert_eq!(
        messages
            .iter()
            .filter(|(s, _)| s.is_terminal())
            .count(),
        1
    );
    assert_eq!(harness.scratch_entries(), 0);
}

#[tokio::test]
async fn test_source_kept_by_default() {
    let harness = TestHarness::new().await;

    harness.submit_default().await;

    let source = ObjectLocation::new("bucket-x", "in/clip.flac");
    assert!(harness.store.contains(&source).await);
    assert!(!harness
        .store
        .operations()
        .await
        .contains(&BlobOperation::Delete(source)));
}

#[tokio::test]
async fn test_source_deleted_when_configured() {
    let harness = TestHarness::with_retention(SourceRetention::Delete).await;

    let report = harness.submit_default().await;

    assert_eq!(report.status, 200);
    assert!(!harness
        .store
        .contains(&ObjectLocation::new("bucket-x", "in/clip.flac"))
        .await);
}

#[tokio::test]
async fn test_best_effort_source_delete_failure_is_ignored() {
    let harness = TestHarness::with_retention(SourceRetention::Delete).await;
    harness
        .store
        .set_next_delete_error(StorageError::Request("connection reset".to_string()))
        .await;

    let report = harness.submit_default().await;

    assert_eq!(report.status, 200);
    assert_eq!(
        harness.messages().await.last().map(|(s, _)| *s),
        Some(NotificationStatus::Success)
    );
}

#[tokio::test]
async fn test_strict_source_delete_failure_fails_job() {
    let harness = TestHarness::with_retention(SourceRetention::DeleteStrict).await;
    harness
        .store
        .set_next_delete_error(StorageError::Http {
            status: 403,
            message: "AccessDenied".to_string(),
        })
        .await;

    let report = harness.submit_default().await;

    assert_eq!(report.status, 500);
    assert!(matches!(
        report.outcome.error(),
        Some(JobError::SourceCleanup(_))
    ));
    let messages = harness.messages().await;
    assert_eq!(messages.len(), 4);
    assert_eq!(
        messages[3],
        error("Error deleting audio file from s3 during cleanup")
    );
}

#[tokio::test]
async fn test_delivery_failure_reports_failure_after_success() {
    let harness = TestHarness::new().await;
    // Only the terminal push fails
    harness.notifier.fail_from(3).await;

    let report = harness.submit_default().await;

    assert_eq!(report.status, 500);
    assert_eq!(report.stage, Stage::Succeeded);
    assert!(matches!(report.outcome.error(), Some(JobError::Delivery(_))));

    // Stages still ran to completion
    assert_eq!(harness.store.put_count().await, 2);
    let sent = harness.notifier.sent().await;
    assert_eq!(sent.len(), 4);
    assert!(!sent[3].delivered);
}

#[tokio::test]
async fn test_gone_connection_does_not_stop_stages() {
    let harness = TestHarness::new().await;
    harness.notifier.mark_gone(CONN).await;

    let report = harness.submit_default().await;

    assert_eq!(report.status, 500);
    assert_eq!(harness.separator.separation_count().await, 1);
    assert_eq!(harness.store.put_count().await, 2);
}

#[tokio::test]
async fn test_backend_name_in_progress_message() {
    let scratch = TempDir::new().unwrap();
    let store = Arc::new(MockBlobStore::new());
    let notifier = Arc::new(MockNotifier::new());
    store
        .insert(ObjectLocation::new("bucket-x", "in/clip.flac"), b"x".to_vec())
        .await;

    let pipeline = JobPipeline::new(
        store,
        Arc::new(MockSeparator::named("demucs", "flac")),
        notifier.clone(),
        fixtures::pipeline_config(scratch.path(), SourceRetention::Keep),
        RESULT_BUCKET,
    );

    let body = fixtures::submit_body(fixtures::SOURCE_URL);
    let report = pipeline.run(CONN, Some(&body)).await;
    assert_eq!(report.status, 200);

    let messages = notifier.messages_for(CONN).await;
    assert_eq!(messages[1], processing("Running demucs..."));

    let notifications = notifier.notifications_for(CONN).await;
    let data = notifications[3].data.as_ref().unwrap();
    assert!(data["vocals_url"].as_str().unwrap().ends_with(".flac"));
}

#[tokio::test]
async fn test_concurrent_jobs_use_separate_workspaces() {
    let harness = TestHarness::new().await;
    let body = fixtures::submit_body(fixtures::SOURCE_URL);

    let (a, b) = tokio::join!(
        harness.pipeline.run("conn-a", Some(&body)),
        harness.pipeline.run("conn-b", Some(&body)),
    );

    assert_eq!(a.status, 200);
    assert_eq!(b.status, 200);
    assert_ne!(a.job_id, b.job_id);
    assert_eq!(harness.notifier.notifications_for("conn-a").await.len(), 4);
    assert_eq!(harness.notifier.notifications_for("conn-b").await.len(), 4);
    assert_eq!(harness.store.keys_in(RESULT_BUCKET).await.len(), 4);
}
