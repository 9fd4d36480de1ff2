use std::time::Duration;

use pressroom::gemini::GeminiClient;
use pressroom_core::assistant::{Assistant, AssistantError, RunContext, PRO_MODEL};
use pressroom_core::retry::RetryPolicy;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FLASH_PATH: &str = "/v1beta/models/gemini-flash-latest:generateContent";

fn client(server: &MockServer, max_retries: u32) -> GeminiClient {
    GeminiClient::new(
        "test-key",
        server.uri(),
        2,
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        },
    )
}

fn text_response(parts: &[&str]) -> Value {
    let parts: Vec<Value> = parts.iter().map(|t| json!({ "text": t })).collect();
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": parts },
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn ask_sends_persona_prompt_and_tools() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FLASH_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": "persona" }] },
            "contents": [{ "role": "user", "parts": [{ "text": "prompt" }] }],
            "tools": [{ "googleSearch": {} }, { "urlContext": {} }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(&["Hello, ", "world."])))
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server, 0)
        .ask(&RunContext::default(), "persona", "prompt")
        .await
        .unwrap();
    assert_eq!(text, "Hello, world.");
}

#[tokio::test]
async fn structured_ask_requests_json_and_parses_it() {
    let server = MockServer::start().await;
    let schema = json!({ "type": "object", "properties": { "title": { "type": "string" } } });
    Mock::given(method("POST"))
        .and(path(FLASH_PATH))
        .and(body_partial_json(json!({
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseJsonSchema": schema.clone()
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(&[r#"{"title":"Hi"}"#])))
        .expect(1)
        .mount(&server)
        .await;

    let value = client(&server, 0)
        .structured_ask(&RunContext::default(), "persona", "prompt", &schema)
        .await
        .unwrap();
    assert_eq!(value, json!({ "title": "Hi" }));
}

#[tokio::test]
async fn bound_model_selects_the_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{PRO_MODEL}:generateContent")))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(&["pro answer."])))
        .expect(1)
        .mount(&server)
        .await;

    let gemini = client(&server, 0);
    let ctx = gemini.with_model(&RunContext::default(), PRO_MODEL);
    assert_eq!(gemini.ask(&ctx, "p", "q").await.unwrap(), "pro answer.");
}

#[tokio::test]
async fn rate_limit_is_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FLASH_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(FLASH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(&["finally."])))
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server, 3)
        .ask(&RunContext::default(), "p", "q")
        .await
        .unwrap();
    assert_eq!(text, "finally.");
}

#[tokio::test]
async fn resource_exhausted_body_counts_as_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FLASH_PATH))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_string(r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#),
        )
        .expect(2)
        .mount(&server)
        .await;

    let err = client(&server, 1)
        .ask(&RunContext::default(), "p", "q")
        .await
        .unwrap_err();
    assert!(err.is_rate_limit(), "unexpected {err:?}");
}

#[tokio::test]
async fn other_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FLASH_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 3)
        .ask(&RunContext::default(), "p", "q")
        .await
        .unwrap_err();
    match err {
        AssistantError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "bad request");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn prompt_feedback_means_blocked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FLASH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let err = client(&server, 3)
        .ask(&RunContext::default(), "p", "q")
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::Blocked(ref reason) if reason == "SAFETY"));
}

#[tokio::test]
async fn empty_candidates_are_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FLASH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = client(&server, 0)
        .ask(&RunContext::default(), "p", "q")
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::InvalidResponse(_)));
}

#[test]
fn default_model_is_flash() {
    let gemini = GeminiClient::new("k", "http://localhost", 1, RetryPolicy::default());
    assert_eq!(gemini.default_model(), "gemini-flash-latest");
}
