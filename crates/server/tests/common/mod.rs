//! Test fixture: an in-process server wired to mock backends.
//!
//! Requests go through the router with `oneshot`; WebSocket tests bind the
//! same router to an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use stemsplit_core::testing::{MockBlobStore, MockRegistry, MockSeparator};
use stemsplit_core::{load_config_from_str, Config, ObjectLocation, SigV4Presigner};
use stemsplit_server::{create_router, AppState};

pub use stemsplit_core::testing::fixtures;

const TEST_CONFIG: &str = r#"
[registry]
backend = "memory"

[storage]
result_bucket = "stems-out"
access_key_id = "AKIDTEST"
secret_access_key = "test-secret-key"
presign_expiry_secs = 600
"#;

pub struct TestFixture {
    pub router: Router,
    pub state: Arc<AppState>,
    pub blob_store: Arc<MockBlobStore>,
    pub separator: Arc<MockSeparator>,
    pub registry: Arc<MockRegistry>,
    /// Holds the scratch directory for the fixture's lifetime.
    pub temp_dir: TempDir,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Fixture whose blob store already holds the object at `fixtures::SOURCE_URL`.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");

        let mut config = test_config();
        config.pipeline.scratch_dir = temp_dir.path().join("scratch");

        let blob_store = Arc::new(MockBlobStore::new());
        let source = ObjectLocation::parse_url(fixtures::SOURCE_URL).expect("source url");
        blob_store.insert(source, b"fLaC-audio".to_vec()).await;

        let separator = Arc::new(MockSeparator::new());
        let registry = Arc::new(MockRegistry::new());
        let presigner =
            Arc::new(SigV4Presigner::from_config(&config.storage).expect("presigner"));

        let state = Arc::new(AppState::new(
            config,
            registry.clone(),
            blob_store.clone(),
            separator.clone(),
            presigner,
        ));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            state,
            blob_store,
            separator,
            registry,
            temp_dir,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.post_raw(path, body.to_string()).await
    }

    pub async fn post_raw(&self, path: &str, body: impl Into<String>) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.into()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        TestResponse { status, body, text }
    }

    /// Serves the router on an ephemeral local port.
    pub async fn spawn(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }
}

pub fn test_config() -> Config {
    load_config_from_str(TEST_CONFIG).expect("test config parses")
}
