//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock encoder injected, so the HTTP surface can be exercised
//! without ffmpeg installed.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use soundshift_core::{
    testing::MockEncoder, Config, ConversionOrchestrator, Encoder, EncoderConfig,
    OrchestratorConfig, ServerConfig,
};
use soundshift_server::{AppState, EncoderStatus};

/// Re-export fixtures for test convenience
pub use soundshift_core::testing::fixtures;

/// Test fixture for E2E testing with a mock encoder.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_convert() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/convert", json!({
///         "inputPaths": ["/music/a.wav"],
///         "options": { "format": "mp3" }
///     })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state behind the router
    pub state: Arc<AppState>,
    /// Mock encoder - control per-file outcomes
    pub encoder: Arc<MockEncoder>,
    /// Temporary directory for input files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Configuration for test fixture
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Worker pool size
    pub max_parallel_encodes: usize,
    /// Whether the startup encoder probe fails
    pub encoder_unavailable: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            max_parallel_encodes: 2,
            encoder_unavailable: false,
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let encoder = Arc::new(MockEncoder::new());
        encoder.set_encode_duration(Duration::from_millis(5)).await;
        if test_config.encoder_unavailable {
            encoder.set_unavailable("ffmpeg not found").await;
        }

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            encoder: EncoderConfig::default(),
            orchestrator: OrchestratorConfig {
                max_parallel_encodes: test_config.max_parallel_encodes,
                ..Default::default()
            },
        };

        let startup_encoder = EncoderStatus::probe(encoder.as_ref()).await;
        let orchestrator = ConversionOrchestrator::new(
            config.orchestrator.clone(),
            Arc::clone(&encoder) as Arc<dyn Encoder>,
        );

        let state = Arc::new(AppState::new(config, orchestrator, startup_encoder));
        let router = soundshift_server::create_router(Arc::clone(&state));

        Self {
            router,
            state,
            encoder,
            temp_dir,
        }
    }

    /// Path inside the fixture's temp directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await.0
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let (response, bytes) = self.send(request).await;
        (response.status, String::from_utf8_lossy(&bytes).to_string())
    }

    /// Serve the router on an ephemeral local port.
    pub async fn serve(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    /// Wait until `count` progress subscribers are attached.
    pub async fn wait_for_subscribers(&self, count: usize) {
        let events = self.state.orchestrator().events();
        for _ in 0..200 {
            if events.subscriber_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} progress subscribers", count);
    }

    /// Poll `/api/v1/files` until every file is terminal.
    pub async fn wait_until_settled(&self, timeout: Duration) -> Vec<Value> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let files = self.get("/api/v1/files").await.body;
            let files = files.as_array().cloned().unwrap_or_default();
            let settled = !files.is_empty()
                && files
                    .iter()
                    .all(|f| f["status"] == "done" || f["status"] == "error");
            if settled {
                return files;
            }
            if tokio::time::Instant::now() > deadline {
                panic!("files did not settle in time: {:?}", files);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_string(&json).unwrap())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await.0
    }

    async fn send(&self, request: Request<Body>) -> (TestResponse, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        (TestResponse { status, body }, body_bytes)
    }
}

/// Lossy string form of a path, as it appears in JSON bodies.
pub fn json_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
