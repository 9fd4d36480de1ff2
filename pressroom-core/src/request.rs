//! Job inputs as the core sees them: the request and the generator configuration.
//!
//! Both arrive base64-encoded JSON objects. Decoding lives here so the job
//! processor only deals with typed values and typed errors.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};
use uuid::Uuid;

/// One content request. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRequest {
    pub id: Uuid,
    pub body: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("request id is missing")]
    MissingId,
    #[error("request id is not a valid UUID: {0}")]
    InvalidId(#[from] uuid::Error),
    #[error("request body is missing")]
    MissingBody,
    #[error("request body is not valid base64: {0}")]
    BodyEncoding(#[source] base64::DecodeError),
    #[error("request body is not valid JSON: {0}")]
    BodyJson(#[source] serde_json::Error),
    #[error("request body must be a JSON object")]
    BodyNotObject,
}

impl ContentRequest {
    pub fn new(id: Uuid, body: Map<String, Value>) -> Self {
        Self { id, body }
    }

    /// Parses a request from its raw id and base64-encoded JSON body.
    pub fn from_encoded(id: Option<&str>, body: Option<&str>) -> Result<Self, IntakeError> {
        let id = non_blank(id).ok_or(IntakeError::MissingId)?;
        let id = Uuid::parse_str(id)?;

        let body = non_blank(body).ok_or(IntakeError::MissingBody)?;
        let bytes = STANDARD.decode(body).map_err(IntakeError::BodyEncoding)?;
        let value: Value = serde_json::from_slice(&bytes).map_err(IntakeError::BodyJson)?;
        match value {
            Value::Object(body) => Ok(Self { id, body }),
            _ => Err(IntakeError::BodyNotObject),
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config is not valid base64: {0}")]
    Encoding(#[source] base64::DecodeError),
    #[error("config is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("config must be a JSON object")]
    NotObject,
    #[error("config key 'model' must be a string")]
    InvalidModel,
}

/// Generator-specific options, e.g. the model tier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratorConfig(Map<String, Value>);

impl GeneratorConfig {
    pub fn new(options: Map<String, Value>) -> Result<Self, ConfigError> {
        match options.get("model") {
            Some(Value::String(_)) | None => Ok(Self(options)),
            Some(_) => Err(ConfigError::InvalidModel),
        }
    }

    /// Absent or blank input yields an empty config.
    pub fn from_encoded(raw: Option<&str>) -> Result<Self, ConfigError> {
        let Some(raw) = non_blank(raw) else {
            return Ok(Self::default());
        };
        let bytes = STANDARD.decode(raw).map_err(ConfigError::Encoding)?;
        match serde_json::from_slice(&bytes).map_err(ConfigError::Json)? {
            Value::Object(options) => Self::new(options),
            _ => Err(ConfigError::NotObject),
        }
    }

    /// The requested model tier, if any.
    pub fn model(&self) -> Option<&str> {
        self.get_str("model")
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}
