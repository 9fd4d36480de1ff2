/// `load_config` module: loads the static YAML config (no secrets) and reads secrets from the environment.
///
/// This module is the only place where user-supplied YAML is parsed into typed settings.
///
/// # Responsibilities
/// - Parse the YAML file into [`CliConfig`], filling defaults for optional keys
/// - Provide [`require_env`] for clients that need a secret (API keys, SMTP password)
/// - Convert retry settings into the core [`RetryPolicy`]
///
/// # Secrets
/// Secrets never live in the YAML file. Each client reads its own from the
/// environment when it is built (`GEMINI_API_KEY`, `TELEGRAPH_API_KEY`,
/// `MAIL_SENDER_PASSWORD`); `.env` is loaded at startup.
///
/// # Errors
/// Loading fails with an `anyhow::Error` naming the file and the cause.
use anyhow::Result;
use pressroom_core::contract::BoxError;
use pressroom_core::retry::RetryPolicy;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const TELEGRAPH_API_KEY_VAR: &str = "TELEGRAPH_API_KEY";
pub const MAIL_SENDER_PASSWORD_VAR: &str = "MAIL_SENDER_PASSWORD";
pub const OLLAMA_BASE_URL_VAR: &str = "OLLAMA_BASE_URL";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CliConfig {
    #[serde(default)]
    pub assistant: AssistantSection,
    #[serde(default)]
    pub publisher: PublisherSection,
    pub notifier: NotifierSection,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    Ollama,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AssistantSection {
    #[serde(default)]
    pub provider: Provider,
    /// Upper bound on in-flight Gemini requests.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Overrides the provider's endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub retry: RetrySection,
}

impl Default for AssistantSection {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            concurrency: default_concurrency(),
            base_url: None,
            retry: RetrySection::default(),
        }
    }
}

fn default_concurrency() -> usize {
    2
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrySection {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
        }
    }
}

impl From<RetrySection> for RetryPolicy {
    fn from(section: RetrySection) -> Self {
        RetryPolicy {
            max_retries: section.max_retries,
            initial_backoff: Duration::from_millis(section.initial_backoff_ms),
            max_backoff: Duration::from_millis(section.max_backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PublisherSection {
    #[serde(default = "default_telegraph_url")]
    pub base_url: String,
}

impl Default for PublisherSection {
    fn default() -> Self {
        Self {
            base_url: default_telegraph_url(),
        }
    }
}

fn default_telegraph_url() -> String {
    "https://api.telegra.ph".to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NotifierSection {
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub sender_email: String,
    pub recipient_email: String,
}

fn default_smtp_port() -> u16 {
    587
}

/// Loads a static YAML config file. Secrets are read later, by the clients that need them.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => conf,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if config.assistant.concurrency == 0 {
        error!(config_path = ?path_ref, "assistant.concurrency must be at least 1");
        return Err(anyhow::anyhow!("assistant.concurrency must be at least 1"));
    }

    info!(
        config_path = ?path_ref,
        provider = ?config.assistant.provider,
        "Parsed config YAML successfully"
    );
    Ok(config)
}

/// Reads a required, non-empty environment variable.
pub fn require_env(name: &str) -> Result<String, BoxError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => {
            error!(variable = name, "Required environment variable missing");
            Err(format!("environment variable {name} must be set").into())
        }
    }
}
