//! Event dispatcher integration tests.
//!
//! Covers routing of transport events: connect and disconnect against the
//! registry, submit through the pipeline, and unknown routes.

use std::sync::Arc;

use tempfile::TempDir;

use stemsplit_core::{
    config::SourceRetention,
    dispatch::{EventDispatcher, LifecycleHandler, TransportEvent},
    notifier::NotificationStatus,
    pipeline::JobPipeline,
    registry::{ConnectionRegistry, RegistryError, SqliteConnectionRegistry},
    storage::ObjectLocation,
    testing::{fixtures, MockBlobStore, MockNotifier, MockRegistry, MockSeparator, RegistryCall},
};

struct TestHarness {
    dispatcher: EventDispatcher,
    registry: Arc<MockRegistry>,
    notifier: Arc<MockNotifier>,
    _scratch: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let scratch = TempDir::new().expect("Failed to create scratch dir");
        let registry = Arc::new(MockRegistry::new());
        let notifier = Arc::new(MockNotifier::new());
        let store = Arc::new(MockBlobStore::new());
        store
            .insert(ObjectLocation::new("bucket-x", "in/clip.flac"), b"fLaC".to_vec())
            .await;

        let pipeline = JobPipeline::new(
            store,
            Arc::new(MockSeparator::new()),
            notifier.clone(),
            fixtures::pipeline_config(scratch.path(), SourceRetention::Keep),
            "stems-out",
        );
        let dispatcher = EventDispatcher::new(
            LifecycleHandler::new(registry.clone()),
            Arc::new(pipeline),
            notifier.clone(),
        );

        Self {
            dispatcher,
            registry,
            notifier,
            _scratch: scratch,
        }
    }
}

#[tokio::test]
async fn test_connect_registers_once() {
    let harness = TestHarness::new().await;

    let response = harness
        .dispatcher
        .dispatch(TransportEvent::connect("abc"))
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(
        harness.registry.calls().await,
        vec![RegistryCall::Register("abc".to_string())]
    );
    assert!(harness.registry.is_registered("abc").await.unwrap());
    // Lifecycle events push nothing
    assert!(harness.notifier.sent().await.is_empty());
}

#[tokio::test]
async fn test_connect_rejected_when_store_fails() {
    let harness = TestHarness::new().await;
    harness
        .registry
        .set_next_error(RegistryError::Unavailable("database is locked".to_string()))
        .await;

    let response = harness
        .dispatcher
        .dispatch(TransportEvent::connect("abc"))
        .await;

    assert_eq!(response.status, 500);
    assert!(!harness.registry.is_registered("abc").await.unwrap());
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let harness = TestHarness::new().await;
    harness
        .dispatcher
        .dispatch(TransportEvent::connect("abc"))
        .await;

    for _ in 0..2 {
        let response = harness
            .dispatcher
            .dispatch(TransportEvent::disconnect("abc"))
            .await;
        assert_eq!(response.status, 200);
    }
    assert_eq!(harness.registry.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_route() {
    let harness = TestHarness::new().await;

    let response = harness
        .dispatcher
        .dispatch(TransportEvent::message("abc", "transcribe", "{}"))
        .await;

    assert_eq!(response.status, 500);
    assert!(response.report.is_none());
    assert_eq!(
        harness.notifier.messages_for("abc").await,
        vec![(NotificationStatus::Error, "Invalid route key".to_string())]
    );
}

#[tokio::test]
async fn test_split_route_runs_pipeline() {
    let harness = TestHarness::new().await;
    let body = fixtures::submit_body(fixtures::SOURCE_URL);

    let response = harness
        .dispatcher
        .dispatch(TransportEvent::message("abc", "split", body))
        .await;

    assert_eq!(response.status, 200);
    assert!(response.is_success());
    assert!(response.report.is_some());

    let messages = harness.notifier.messages_for("abc").await;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1].1, "Running spleeter...");
    assert_eq!(messages[3].0, NotificationStatus::Success);
}

#[tokio::test]
async fn test_submit_without_url_is_client_error() {
    let harness = TestHarness::new().await;

    let response = harness
        .dispatcher
        .dispatch(TransportEvent::message("abc", "submit", "{}"))
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(
        harness.notifier.messages_for("abc").await,
        vec![(NotificationStatus::Error, "No url provided".to_string())]
    );
}

#[tokio::test]
async fn test_lifecycle_against_sqlite_registry() {
    let dir = TempDir::new().unwrap();
    let registry: Arc<dyn ConnectionRegistry> =
        Arc::new(SqliteConnectionRegistry::new(&dir.path().join("registry.db")).unwrap());
    let handler = LifecycleHandler::new(registry.clone());

    assert!(handler.on_connect("c1").await.is_accepted());
    assert!(handler.on_connect("c2").await.is_accepted());
    assert!(handler.on_connect("c1").await.is_accepted());
    assert_eq!(registry.count().await.unwrap(), 2);

    assert!(handler.on_disconnect("c1").await.is_accepted());
    assert!(!registry.is_registered("c1").await.unwrap());
    assert!(registry.is_registered("c2").await.unwrap());
}
