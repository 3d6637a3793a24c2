mod common;

use serde_json::json;
use thalli_common::ThalliError;
use thalli_llm::gemini::GeminiClient;
use thalli_llm::openai::OpenAiClient;
use thalli_llm::traits::LlmClient;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-1.5-pro-latest";

fn gemini(server: &MockServer) -> GeminiClient {
    GeminiClient::with_base_url(&server.uri(), "test-key".into(), MODEL.into()).unwrap()
}

#[tokio::test]
async fn gemini_correction_round_trip() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/models/{MODEL}:generateContent")))
        .and(query_param("key", "test-key"))
        .and(body_string_contains(
            "Correct grammar, improve formatting, preserve structure:",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "The kettle " }, { "text": "boils water." }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "totalTokenCount": 42 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = gemini(&server);
    let text = client.correct_document("teh kettle boil water").await.unwrap();
    assert_eq!(text, "The kettle boils water.");
}

#[tokio::test]
async fn gemini_sends_generation_defaults() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "generationConfig": { "temperature": 0.5, "maxOutputTokens": 256 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = gemini(&server).with_generation(Some(0.5), Some(256));
    let resp = client.generate("hi", None, None, None).await.unwrap();
    assert_eq!(resp.text, "ok");
    assert_eq!(resp.model.as_deref(), Some(MODEL));
}

#[tokio::test]
async fn gemini_safety_block_is_an_agent_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })))
        .mount(&server)
        .await;

    let err = gemini(&server).generate("x", None, None, None).await.unwrap_err();
    match err {
        ThalliError::Agent(msg) => assert!(msg.contains("blocked"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn gemini_bad_key_surfaces_as_agent_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "API key not valid" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = gemini(&server).generate("x", None, None, None).await.unwrap_err();
    match err {
        ThalliError::Agent(msg) => assert!(msg.contains("API key not valid"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn gemini_health_check_reports_reachability() {
    common::init_test_tracing();
    let healthy = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "generationConfig": { "maxOutputTokens": 5 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "OK" }] } }]
        })))
        .expect(1)
        .mount(&healthy)
        .await;
    assert!(gemini(&healthy).health_check().await.unwrap());

    let rejecting = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "API key not valid" }
        })))
        .mount(&rejecting)
        .await;
    assert!(!gemini(&rejecting).health_check().await.unwrap());
}

#[tokio::test]
async fn openai_collects_output_text() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "gpt-4o-mini" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini",
            "output": [{
                "type": "message",
                "content": [{ "type": "output_text", "text": "Best answer." }]
            }],
            "usage": { "total_tokens": 12 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/v1", server.uri());
    let client = OpenAiClient::new("sk-test".into(), "gpt-4o-mini".into(), Some(&base)).unwrap();
    let answer = client
        .synthesize_answer("what is rust", &["A language.".to_string()])
        .await
        .unwrap();
    assert_eq!(answer, "Best answer.");
}
