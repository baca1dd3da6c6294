//! Common test utilities for in-process API testing.
//!
//! The fixture builds the real router from configuration with a scripted
//! HTTP transport underneath every provider, so no network is touched.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use apothecary_core::{load_config_from_str, testing::MockTransport};
use apothecary_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use apothecary_core::testing::fixtures;

/// Default configuration: knowledge base, OpenAI-compatible completion, and
/// vision OCR with the local fallback.
pub const DEFAULT_CONFIG: &str = r#"
[retry]
max_attempts = 2
base_delay_ms = 10

[assistant]
keywords = ["fever", "paracetamol"]

[assistant.completion]
api = "openai"
model = "gpt-4o-mini"
api_key = "sk-secret"
api_base = "http://llm.local"

[assistant.knowledge_base]
api_base = "http://kb.local"
api_key = "kb-secret"

[ocr]
fallback_text = "manual entry required"
fallback_confidence = 10

[ocr.vision]
api_key = "vision-secret"
api_base = "http://vision.local"

[substitution]
max_results = 5
"#;

/// Test fixture for API testing with a scripted transport.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_chat() {
///     let fixture = TestFixture::new();
///     fixture.transport.push("/v1/chat/completions", reply);
///
///     let response = fixture.post("/api/v1/assistant/chat", json!({ "message": "hi" })).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Scripted transport - configure provider replies
    pub transport: Arc<MockTransport>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a fixture with [`DEFAULT_CONFIG`].
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CONFIG)
    }

    /// Create a fixture from a TOML configuration.
    pub fn with_config(toml: &str) -> Self {
        let config = load_config_from_str(toml).expect("Invalid test config");
        let transport = Arc::new(MockTransport::new());
        let state = AppState::from_config(config, Some(transport.clone()))
            .expect("Failed to build app state");

        Self {
            router: create_router(Arc::new(state)),
            transport,
        }
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
        self.send(request).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
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
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
