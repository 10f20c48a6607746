//! Gemini / Google placeholder backend
//!
//! Posts `{input}` to a configured endpoint and hands back the body untouched.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::backend::traits::ModelBackend;
use crate::config::GeminiConfig;
use crate::error::{AppError, Result};

pub struct GeminiBackend {
    client: Client,
    endpoint: Option<String>,
}

impl GeminiBackend {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    async fn ask(&self, query: &str) -> Result<String> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| AppError::NotConfigured("GOOGLE_API_ENDPOINT is not set".to_string()))?;

        debug!(endpoint = %endpoint, "Sending Gemini request");

        let response = self
            .client
            .post(endpoint)
            .json(&json!({ "input": query }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(AppError::BackendError(format!(
                "Gemini endpoint returned {}: {}",
                status, body
            )))
        }
    }
}
