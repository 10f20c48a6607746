//! API request and response models

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, Result};

/// Body fields accepted as the query, in priority order
const QUERY_FIELDS: &[&str] = &["query", "prompt", "message"];

pub const DEFAULT_MODEL: &str = "hf";

pub const INVALID_BODY_MESSAGE: &str = "Body must be JSON with a \"query\" string";

/// Ask request as documented; parsing goes through [`AskRequest::from_value`]
/// so that the `prompt`/`message` aliases and lenient `models` handling apply
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct AskRequest {
    /// The question to send to every selected backend
    pub query: String,

    /// Backend identifiers (`hf`, `openai`, `gemini`); defaults to `["hf"]`
    #[serde(default)]
    pub models: Vec<String>,
}

impl AskRequest {
    /// Build a request from an arbitrary JSON body
    pub fn from_value(body: &Value) -> Result<Self> {
        let invalid = || AppError::InvalidRequest(INVALID_BODY_MESSAGE.to_string());

        let query = QUERY_FIELDS
            .iter()
            .find_map(|field| body.get(*field).filter(|v| !v.is_null()))
            .ok_or_else(invalid)?
            .as_str()
            .filter(|q| !q.is_empty())
            .ok_or_else(invalid)?
            .to_string();

        // Non-string entries keep their slot so results line up with the input
        let mut models: Vec<String> = match body.get("models") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        };
        if models.is_empty() {
            models.push(DEFAULT_MODEL.to_string());
        }

        Ok(Self { query, models })
    }

    /// Parse a raw request body
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|_| AppError::InvalidRequest(INVALID_BODY_MESSAGE.to_string()))?;
        Self::from_value(&value)
    }
}

/// Outcome of asking one backend
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct BackendResult {
    /// The model identifier as requested
    pub model: String,

    pub ok: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Structured diagnostics, e.g. every predict probe that was tried
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub debug: Option<Value>,
}

impl BackendResult {
    pub fn success(model: &str, text: String) -> Self {
        Self {
            model: model.to_string(),
            ok: true,
            text: Some(text),
            error: None,
            debug: None,
        }
    }

    pub fn failure(model: &str, error: &AppError) -> Self {
        Self {
            model: model.to_string(),
            ok: false,
            text: None,
            error: Some(error.to_string()),
            debug: error.debug(),
        }
    }
}

/// Combined answer of all backends
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AskResponse {
    pub query: String,
    pub results: Vec<BackendResult>,
    /// ISO-8601 UTC timestamp
    pub timestamp: String,
}

/// Static usage payload returned for GET
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UsageResponse {
    pub status: String,
    pub note: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct BackendInfo {
    pub model: String,
    pub configured: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct BackendListResponse {
    pub backends: Vec<BackendInfo>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
