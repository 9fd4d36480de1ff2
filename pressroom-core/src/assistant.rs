//! # assistant: the language-model capability seen by generators
//!
//! Any backend (remote API, local inference server, test mock) implements
//! [`Assistant`]. Generators only ever talk to this trait.
//!
//! The model to use is carried explicitly in a [`RunContext`] rather than in
//! ambient state: the job binds a model once with [`Assistant::with_model`] and
//! passes the derived context to every subsequent call. A context without a
//! model falls back to [`Assistant::default_model`].
//!
//! The context also carries the run's [`CancellationToken`], which
//! implementations hand to the retry executor.

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::retry::RetryError;

/// Model tier `pro` resolves to this identifier.
pub const PRO_MODEL: &str = "gemini-pro-latest";
/// Model tier `basic` resolves to this identifier.
pub const BASIC_MODEL: &str = "gemini-flash-latest";

/// Maps a caller-facing tier to a concrete model identifier.
///
/// Unknown tiers are taken to be model identifiers already and pass through.
pub fn select_model(tier: &str) -> String {
    match tier {
        "pro" => PRO_MODEL.to_owned(),
        "basic" => BASIC_MODEL.to_owned(),
        other => other.to_owned(),
    }
}

/// Per-run state threaded through generation.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    model: Option<String>,
    cancel: CancellationToken,
}

impl RunContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            model: None,
            cancel,
        }
    }

    /// A copy of this context bound to `model`. Shares the cancellation token.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            cancel: self.cancel.clone(),
        }
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("rate limited by model backend: {0}")]
    RateLimited(String),
    #[error("model backend returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("request to model backend failed: {0}")]
    Transport(String),
    #[error("content blocked by model backend: {0}")]
    Blocked(String),
    #[error("invalid response from model backend: {0}")]
    InvalidResponse(String),
    #[error("assistant call cancelled")]
    Cancelled,
}

impl AssistantError {
    /// Rate limiting is the only failure worth retrying.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, AssistantError::RateLimited(_))
    }
}

impl From<RetryError<AssistantError>> for AssistantError {
    fn from(err: RetryError<AssistantError>) -> Self {
        match err {
            RetryError::Cancelled => AssistantError::Cancelled,
            RetryError::Failed(e) => e,
        }
    }
}

/// A language-model backend.
///
/// `persona` is the system instruction steering the style of the answer;
/// `prompt` is the actual request.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Free-text answer.
    async fn ask(
        &self,
        ctx: &RunContext,
        persona: &str,
        prompt: &str,
    ) -> Result<String, AssistantError>;

    /// Answer constrained to JSON matching `schema`.
    async fn structured_ask(
        &self,
        ctx: &RunContext,
        persona: &str,
        prompt: &str,
        schema: &Value,
    ) -> Result<Value, AssistantError>;

    /// Derives a context that makes later calls use `model`.
    fn with_model(&self, ctx: &RunContext, model: &str) -> RunContext {
        ctx.with_model(model)
    }

    /// Model used when the context does not name one.
    fn default_model(&self) -> String;
}

/// The model a call with `ctx` should use on `assistant`.
pub fn effective_model(assistant: &dyn Assistant, ctx: &RunContext) -> String {
    ctx.model()
        .map(str::to_owned)
        .unwrap_or_else(|| assistant.default_model())
}
