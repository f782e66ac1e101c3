use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::GenerationClient;
use crate::state::{Role, Turn};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Gemini API error: {status} {body}")]
    Transport { status: u16, body: String },
    #[error("Gemini request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Gemini returned a malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: Role,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(base_url: Option<String>, model: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self {
            client: Client::new(),
            base_url,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, credential: &str, history: &[Turn]) -> Result<String, GenerateError> {
        let request = build_request(history);

        let response = self
            .client
            .post(self.url())
            .query(&[("key", credential)])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Transport { status, body });
        }

        let body = response.text().await?;
        let parsed: Value = serde_json::from_str(&body)?;
        Ok(first_candidate_text(&parsed))
    }
}

fn build_request(history: &[Turn]) -> GeminiRequest<'_> {
    GeminiRequest {
        contents: history
            .iter()
            .map(|turn| GeminiContent {
                role: turn.role,
                parts: vec![GeminiPart { text: &turn.text }],
            })
            .collect(),
    }
}

/// Newline-joined text of the first candidate.
///
/// Anything missing or of the wrong type along
/// `candidates[0].content.parts[*].text` reads as empty.
fn first_candidate_text(response: &Value) -> String {
    let parts = response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array);

    match parts {
        Some(parts) => parts
            .iter()
            .map(|part| part.get("text").and_then(Value::as_str).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n"),
        None => String::new(),
    }
}
