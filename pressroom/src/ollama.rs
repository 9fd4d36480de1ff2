//! Ollama assistant over the local `/api/chat` endpoint.
//!
//! Ollama has no schema-constrained output, so structured asks append the
//! schema to the persona, request JSON mode and strip code fences before parsing.

use async_trait::async_trait;
use pressroom_core::assistant::{Assistant, AssistantError, RunContext};
use pressroom_core::retry::{RetryPolicy, Retryer};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::load_config::{AssistantSection, OLLAMA_BASE_URL_VAR};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";

const SCHEMA_INSTRUCTION: &str =
    "\n\nYou must respond with valid JSON that matches the following schema:\n";

pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        }
    }

    /// Endpoint from the config, else `OLLAMA_BASE_URL`, else the local default.
    pub fn from_config(section: &AssistantSection) -> Self {
        let base_url = section
            .base_url
            .clone()
            .or_else(|| std::env::var(OLLAMA_BASE_URL_VAR).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        info!(base_url = %base_url, "Initialized Ollama client");
        Self::new(base_url, section.retry.into())
    }

    async fn chat(
        &self,
        ctx: &RunContext,
        persona: &str,
        prompt: &str,
        json_mode: bool,
    ) -> Result<String, AssistantError> {
        let model = ctx
            .model()
            .map(str::to_owned)
            .unwrap_or_else(|| self.default_model());
        let request = ChatRequest {
            model: &model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: persona,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            format: json_mode.then_some("json"),
            stream: false,
        };
        let request = &request;
        Retryer::new(self.retry, AssistantError::is_rate_limit, move || {
            self.chat_once(request)
        })
        .run(ctx.cancel_token())
        .await
        .map_err(AssistantError::from)
    }

    async fn chat_once(&self, request: &ChatRequest<'_>) -> Result<String, AssistantError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(model = request.model, "[OLLAMA] Sending chat request");
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AssistantError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(AssistantError::RateLimited(message));
            }
            return Err(AssistantError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::InvalidResponse(e.to_string()))?;
        Ok(parsed.message.content)
    }
}

/// Removes a surrounding ```json (or bare ```) fence.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[async_trait]
impl Assistant for OllamaClient {
    async fn ask(
        &self,
        ctx: &RunContext,
        persona: &str,
        prompt: &str,
    ) -> Result<String, AssistantError> {
        self.chat(ctx, persona, prompt, false).await
    }

    async fn structured_ask(
        &self,
        ctx: &RunContext,
        persona: &str,
        prompt: &str,
        schema: &Value,
    ) -> Result<Value, AssistantError> {
        let persona = format!("{persona}{SCHEMA_INSTRUCTION}{schema}");
        let text = self.chat(ctx, &persona, prompt, true).await?;
        serde_json::from_str(strip_code_fence(&text))
            .map_err(|e| AssistantError::InvalidResponse(e.to_string()))
    }

    fn default_model(&self) -> String {
        DEFAULT_MODEL.to_string()
    }
}
