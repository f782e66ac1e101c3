//! Gemini wire-format contract tests.
//!
//! These pin down the request the client sends and how each kind of
//! response is mapped, against a local mock server.

use nova_core::{GeminiClient, GenerateError, GenerationClient, Turn};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-1.5-flash:generateContent";

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new(Some(server.uri()), None)
}

#[tokio::test]
async fn test_request_carries_key_and_role_tagged_history() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "secret key"))
        .and(body_json(json!({
            "contents": [
                {"role": "user", "parts": [{"text": "Hello"}]},
                {"role": "model", "parts": [{"text": "Hi"}]},
                {"role": "user", "parts": [{"text": "How are you?"}]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Fine"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let history = vec![Turn::user("Hello"), Turn::model("Hi"), Turn::user("How are you?")];
    let reply = client_for(&server).generate("secret key", &history).await.unwrap();

    assert_eq!(reply, "Fine");
}

#[tokio::test]
async fn test_parts_of_first_candidate_are_newline_joined() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                {"content": {"parts": [{"text": "line one"}, {"text": "line two"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        })))
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .generate("k", &[Turn::user("Hello")])
        .await
        .unwrap();

    assert_eq!(reply, "line one\nline two");
}

#[tokio::test]
async fn test_missing_candidates_yield_empty_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .generate("k", &[Turn::user("Hello")])
        .await
        .unwrap();

    assert_eq!(reply, "");
}

#[tokio::test]
async fn test_wrong_typed_candidates_yield_empty_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": "blocked"}]
        })))
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .generate("k", &[Turn::user("Hello")])
        .await
        .unwrap();

    assert_eq!(reply, "");
}

#[tokio::test]
async fn test_error_status_maps_to_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate("k", &[Turn::user("Hello")])
        .await
        .unwrap_err();

    match &err {
        GenerateError::Transport { status, body } => {
            assert_eq!(*status, 500);
            assert_eq!(body, "server error");
        }
        other => panic!("expected transport error, got {:?}", other),
    }
    assert_eq!(err.to_string(), "Gemini API error: 500 server error");
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate("k", &[Turn::user("Hello")])
        .await
        .unwrap_err();

    assert!(matches!(err, GenerateError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_custom_model_changes_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(Some(server.uri()), Some("gemini-2.0-pro".to_string()));
    assert_eq!(client.model(), "gemini-2.0-pro");
    let reply = client.generate("k", &[Turn::user("Hello")]).await.unwrap();

    assert_eq!(reply, "ok");
}
