//! OpenAI Chat Completions backend

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use crate::backend::traits::ModelBackend;
use crate::config::OpenAIConfig;
use crate::error::{AppError, Result};

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat completion request (OpenAI compatible)
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

pub struct OpenAIBackend {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAIBackend {
    pub fn new(config: &OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// First choice's message content, or the whole response as JSON text
fn extract_content(response: &Value) -> String {
    response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| response.to_string())
}

#[async_trait]
impl ModelBackend for OpenAIBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn ask(&self, query: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::NotConfigured("OPENAI_API_KEY is not set".to_string()))?;

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: query.to_string(),
            }],
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, model = %self.model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            let body = response.json::<Value>().await.map_err(|e| {
                error!(error = %e, "Failed to parse chat completion response");
                AppError::BackendError(format!("Failed to parse response: {}", e))
            })?;
            Ok(extract_content(&body))
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AppError::BackendError(format!(
                "OpenAI returned {}: {}",
                status, body
            )))
        }
    }
}
