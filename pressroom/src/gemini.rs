//! Gemini assistant over the `generateContent` REST endpoint.
//!
//! Every call goes through the core retry executor; only rate limiting
//! (HTTP 429 or a `RESOURCE_EXHAUSTED` status in the body) is retried.
//! A semaphore bounds the number of requests in flight across all callers.

use std::sync::Arc;

use async_trait::async_trait;
use pressroom_core::assistant::{Assistant, AssistantError, RunContext, BASIC_MODEL};
use pressroom_core::contract::BoxError;
use pressroom_core::retry::{RetryPolicy, Retryer};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::load_config::{require_env, AssistantSection, GEMINI_API_KEY_VAR};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    limiter: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        concurrency: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            limiter: Arc::new(Semaphore::new(concurrency.max(1))),
            retry,
        }
    }

    /// Builds a client from the assistant settings and `GEMINI_API_KEY`.
    pub fn from_env(section: &AssistantSection) -> Result<Self, BoxError> {
        let api_key = require_env(GEMINI_API_KEY_VAR)?;
        let base_url = section.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        info!(
            base_url,
            concurrency = section.concurrency,
            "Initialized Gemini client from environment"
        );
        Ok(Self::new(
            api_key,
            base_url,
            section.concurrency,
            section.retry.into(),
        ))
    }

    fn model_for(&self, ctx: &RunContext) -> String {
        ctx.model()
            .map(str::to_owned)
            .unwrap_or_else(|| self.default_model())
    }

    async fn generate(&self, ctx: &RunContext, body: Value) -> Result<String, AssistantError> {
        let model = self.model_for(ctx);
        let body = &body;
        let model = model.as_str();
        Retryer::new(self.retry, AssistantError::is_rate_limit, move || {
            self.generate_once(model, body)
        })
        .run(ctx.cancel_token())
        .await
        .map_err(AssistantError::from)
    }

    async fn generate_once(&self, model: &str, body: &Value) -> Result<String, AssistantError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| AssistantError::Cancelled)?;

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        debug!(model, "[GEMINI] Sending generateContent request");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AssistantError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status == StatusCode::TOO_MANY_REQUESTS || message.contains("RESOURCE_EXHAUSTED") {
                warn!(model, status = status.as_u16(), "[GEMINI] Rate limited");
                return Err(AssistantError::RateLimited(message));
            }
            return Err(AssistantError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::InvalidResponse(e.to_string()))?;
        parsed.into_text()
    }
}

fn request_body(persona: &str, prompt: &str) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": persona }] },
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
    })
}

#[async_trait]
impl Assistant for GeminiClient {
    async fn ask(
        &self,
        ctx: &RunContext,
        persona: &str,
        prompt: &str,
    ) -> Result<String, AssistantError> {
        let mut body = request_body(persona, prompt);
        body["tools"] = json!([{ "googleSearch": {} }, { "urlContext": {} }]);
        self.generate(ctx, body).await
    }

    async fn structured_ask(
        &self,
        ctx: &RunContext,
        persona: &str,
        prompt: &str,
        schema: &Value,
    ) -> Result<Value, AssistantError> {
        let mut body = request_body(persona, prompt);
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseJsonSchema": schema,
        });
        let text = self.generate(ctx, body).await?;
        serde_json::from_str(&text).map_err(|e| AssistantError::InvalidResponse(e.to_string()))
    }

    fn default_model(&self) -> String {
        BASIC_MODEL.to_string()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String, AssistantError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(AssistantError::Blocked(reason));
        }
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::InvalidResponse("no candidates".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_default();
            if matches!(reason.as_str(), "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST") {
                return Err(AssistantError::Blocked(reason));
            }
            return Err(AssistantError::InvalidResponse(format!(
                "candidate has no text (finish reason: {reason:?})"
            )));
        }
        Ok(text)
    }
}
