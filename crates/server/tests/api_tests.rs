//! In-process API tests with a scripted provider transport.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use apothecary_core::provider::HttpReply;
use apothecary_core::ProviderError;
use common::{fixtures, TestFixture};

fn kb_reply(answer: &str, confidence: f32) -> HttpReply {
    HttpReply::new(
        200,
        json!({ "answer": answer, "confidence": confidence, "sources": ["Drug leaflet"] })
            .to_string(),
    )
}

fn completion_reply(content: &str) -> HttpReply {
    HttpReply::new(
        200,
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
            .to_string(),
    )
}

// ============================================================================
// Health, config, metrics
// ============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_hides_secrets() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(!response.text.contains("sk-secret"));
    assert!(!response.text.contains("kb-secret"));
    assert!(!response.text.contains("vision-secret"));
    assert_eq!(response.body["assistant"]["completion"]["api_key_configured"], true);
    assert_eq!(response.body["substitution"]["max_results"], 5);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/api/v1/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("apothecary_http_requests_total"));
}

// ============================================================================
// Assistant
// ============================================================================

#[tokio::test]
async fn test_chat_rejects_empty_message() {
    let fixture = TestFixture::new();
    let response = fixture
        .post("/api/v1/assistant/chat", json!({ "message": "   " }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("empty"));
    assert_eq!(fixture.transport.request_count(), 0);
}

#[tokio::test]
async fn test_chat_answers_from_knowledge_base() {
    let fixture = TestFixture::new();
    fixture.transport.push(
        "kb.local/query",
        kb_reply("Paracetamol reduces fever; adults take 500mg to 1g per dose.", 90.0),
    );

    let response = fixture
        .post(
            "/api/v1/assistant/chat",
            json!({ "message": "What helps with a fever?", "conversation_id": "c-1" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["source"], "knowledge_base");
    assert_eq!(response.body["used_knowledge_base"], true);
    assert_eq!(response.body["locale"], "en");
    assert_eq!(response.body["conversation_id"], "c-1");
    assert!(response.body["text"].as_str().unwrap().contains("Drug leaflet"));
    assert_eq!(fixture.transport.count_matching("/v1/chat/completions"), 0);
}

#[tokio::test]
async fn test_chat_uses_completion_with_history_and_metrics() {
    let fixture = TestFixture::new();
    fixture
        .transport
        .push("/v1/chat/completions", completion_reply("You sold 250.00 EGP today."));

    let response = fixture
        .post(
            "/api/v1/assistant/chat",
            json!({
                "message": "How are sales today?",
                "history": [
                    { "role": "user", "content": "hello" },
                    { "role": "assistant", "content": "Hi! How can I help?" }
                ],
                "metrics": { "revenue_today": 250.0, "currency": "EGP" }
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["source"], "general_completion");
    assert_eq!(response.body["knowledge_base"]["status"], "skipped_not_domain");

    let requests = fixture.transport.requests();
    let body = format!("{:?}", requests[0].request.body);
    assert!(body.contains("Hi! How can I help?"));
    assert!(body.contains("250.00"));
}

#[tokio::test]
async fn test_chat_falls_back_to_canned_answer() {
    let fixture = TestFixture::new();
    fixture.transport.push_error(
        "kb.local/query",
        ProviderError::Transient("connection refused".into()),
    );
    fixture
        .transport
        .set_repeating("/v1/chat/completions", HttpReply::new(500, "upstream down"));

    let response = fixture
        .post("/api/v1/assistant/chat", json!({ "message": "Is paracetamol a safe fever medicine?" }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["source"], "canned");
    assert_eq!(response.body["knowledge_base"]["status"], "unavailable");
    assert!(response.body["text"]
        .as_str()
        .unwrap()
        .to_lowercase()
        .contains("pharmacist"));
    assert_eq!(fixture.transport.count_matching("/v1/chat/completions"), 2);
}

#[tokio::test]
async fn test_chat_arabic_message_gets_arabic_locale() {
    let fixture = TestFixture::new();
    fixture
        .transport
        .push("/v1/chat/completions", completion_reply("مرحبا! كيف أساعدك؟"));

    let response = fixture
        .post("/api/v1/assistant/chat", json!({ "message": "مرحبا" }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["locale"], "ar");
}

#[tokio::test]
async fn test_chat_malformed_json() {
    let fixture = TestFixture::new();
    let response = fixture.post_raw("/api/v1/assistant/chat", "{not json").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// OCR
// ============================================================================

#[tokio::test]
async fn test_ocr_extracts_with_vision() {
    let fixture = TestFixture::new();
    fixture.transport.push(
        "images:annotate",
        HttpReply::new(200, fixtures::vision_reply("Panadol Extra", &[0.92])),
    );

    let response = fixture
        .post(
            "/api/v1/ocr/extract",
            json!({ "image_base64": "aGVsbG8=", "mime_type": "image/jpeg" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["text"], "Panadol Extra");
    assert_eq!(response.body["provider"], "vision");
    assert_eq!(response.body["rejected"][0]["provider"], "local_fallback");
}

#[tokio::test]
async fn test_ocr_falls_back_to_local_text() {
    let fixture = TestFixture::new();
    fixture.transport.set_repeating_error(
        "images:annotate",
        ProviderError::Api { status: 403, message: "bad key".into() },
    );

    let response = fixture
        .post("/api/v1/ocr/extract", json!({ "image_url": "https://img.local/rx.png" }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["provider"], "local_fallback");
    assert_eq!(response.body["text"], "manual entry required");
}

#[tokio::test]
async fn test_ocr_input_errors() {
    let fixture = TestFixture::new();

    let response = fixture.post("/api/v1/ocr/extract", json!({})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = fixture
        .post(
            "/api/v1/ocr/extract",
            json!({ "image_base64": "aGVsbG8=", "image_url": "https://img.local/a.png" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = fixture
        .post("/api/v1/ocr/extract", json!({ "image_url": "file:///etc/passwd" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    assert_eq!(fixture.transport.request_count(), 0);
}

#[tokio::test]
async fn test_ocr_disabled_is_unavailable() {
    let fixture = TestFixture::with_config("[ocr]\nlocal_fallback = false\n");
    let response = fixture
        .post("/api/v1/ocr/extract", json!({ "image_base64": "aGVsbG8=" }))
        .await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_ocr_exhaustion_is_bad_gateway() {
    let fixture = TestFixture::with_config(
        r#"
[retry]
max_attempts = 1

[ocr]
local_fallback = false

[ocr.vision]
api_key = "k"
api_base = "http://vision.local"
"#,
    );
    fixture
        .transport
        .push("images:annotate", HttpReply::new(503, "busy"));

    let response = fixture
        .post("/api/v1/ocr/extract", json!({ "image_base64": "aGVsbG8=" }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(response.body["error"].as_str().unwrap().contains("exhausted"));
}

// ============================================================================
// Substitutes
// ============================================================================

#[tokio::test]
async fn test_rank_substitutes() {
    let fixture = TestFixture::new();
    let reference = fixtures::medicine("ref", "Ibuprofen", "nsaid", "400mg", "tablet", "Abbott");
    let same_generic = fixtures::medicine("a", "ibuprofen", "nsaid", "200mg", "tablet", "Pharco");
    let same_class = fixtures::medicine("b", "Diclofenac", "NSAID", "50mg", "tablet", "Novartis");

    let response = fixture
        .post(
            "/api/v1/substitutes/rank",
            json!({
                "reference": reference,
                "candidates": [same_class, same_generic],
                "availability": { "a": "low_stock", "b": "in_stock" }
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["reference_id"], "ref");
    let candidates = response.body["candidates"].as_array().unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0]["id"], "a");
    assert_eq!(candidates[0]["score"], 100.0);
    assert_eq!(candidates[0]["tier"], "same_generic");
    assert_eq!(candidates[1]["id"], "b");
    assert_eq!(candidates[1]["score"], 95.0);
    assert!(candidates[0]["warnings"][0].as_str().unwrap().contains("200mg"));
    assert!(response.body["availability_warning"].is_string());
}

#[tokio::test]
async fn test_rank_respects_max_results_cap() {
    let fixture = TestFixture::new();
    let reference = fixtures::medicine("ref", "X", "", "", "", "");
    let candidates: Vec<_> = (0..8)
        .map(|i| fixtures::medicine(&format!("c{}", i), "X", "", "", "", ""))
        .collect();

    let response = fixture
        .post(
            "/api/v1/substitutes/rank",
            json!({ "reference": reference, "candidates": candidates, "max_results": 50 }),
        )
        .await;
    assert_eq!(response.body["candidates"].as_array().unwrap().len(), 5);

    let response = fixture
        .post(
            "/api/v1/substitutes/rank",
            json!({ "reference": reference, "candidates": candidates, "max_results": 2 }),
        )
        .await;
    assert_eq!(response.body["candidates"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_rank_requires_reference_id() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/api/v1/substitutes/rank",
            json!({ "reference": { "id": "" }, "candidates": [] }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
