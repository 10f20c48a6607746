//! Minimal Gradio client for HuggingFace Spaces
//!
//! Connecting fetches the Space's `/config`, which proves the Space is awake
//! and lists the named endpoints it exposes. Calls go through the queue API:
//! `POST /call/<name>` returns an event id, and `GET /call/<name>/<id>` streams
//! server-sent events until `complete` or `error`.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{AppError, Result};

/// Turn `owner/space-name` into the Space's direct URL; full URLs pass through
pub fn resolve_space_url(space: &str) -> Result<String> {
    let space = space.trim();
    if space.starts_with("http://") || space.starts_with("https://") {
        return Ok(space.trim_end_matches('/').to_string());
    }

    match space.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            let subdomain = format!("{}-{}", owner, name)
                .to_lowercase()
                .replace(['_', '.'], "-");
            Ok(format!("https://{}.hf.space", subdomain))
        }
        _ => Err(AppError::NotConfigured(format!(
            "HF_SPACE must look like owner/space-name, got '{}'",
            space
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct SpaceConfig {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
struct Dependency {
    #[serde(default)]
    api_name: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QueuedCall {
    event_id: String,
}

/// An established connection to one Space
#[derive(Debug)]
pub struct GradioConnection {
    base_url: String,
    client: Client,
    token: Option<String>,
    version: Option<String>,
    endpoints: Vec<String>,
}

impl GradioConnection {
    pub async fn connect(base_url: &str, client: Client, token: Option<String>) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let url = format!("{}/config", base_url);

        let mut request = client.get(&url);
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::BackendError(format!(
                "Space config at {} returned {}: {}",
                url, status, body
            )));
        }

        let config = response.json::<SpaceConfig>().await.map_err(|e| {
            AppError::BackendError(format!("Space config is not valid JSON: {}", e))
        })?;

        // api_name is `false` for unnamed endpoints
        let endpoints: Vec<String> = config
            .dependencies
            .iter()
            .filter_map(|d| d.api_name.as_ref().and_then(Value::as_str))
            .map(|name| name.trim_start_matches('/').to_string())
            .collect();

        info!(
            url = %base_url,
            version = config.version.as_deref().unwrap_or("unknown"),
            endpoints = endpoints.len(),
            "Connected to Gradio Space"
        );

        Ok(Self {
            base_url,
            client,
            token,
            version: config.version,
            endpoints,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Spaces that publish no endpoint names are given the benefit of the doubt
    pub fn has_endpoint(&self, api_name: &str) -> bool {
        let name = api_name.trim_start_matches('/');
        self.endpoints.is_empty() || self.endpoints.iter().any(|e| e == name)
    }

    /// Call a named endpoint with the message as its only argument
    pub async fn predict(&self, api_name: &str, message: &str) -> Result<Value> {
        let name = api_name.trim_start_matches('/');
        if !self.has_endpoint(name) {
            return Err(AppError::BackendError(format!(
                "Space does not expose endpoint /{}",
                name
            )));
        }

        let call_url = format!("{}/call/{}", self.base_url, name);
        let mut request = self.client.post(&call_url).json(&json!({ "data": [message] }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::BackendError(format!(
                "Space call {} returned {}: {}",
                call_url, status, body
            )));
        }
        let queued = response.json::<QueuedCall>().await.map_err(|e| {
            AppError::BackendError(format!("Space call returned no event id: {}", e))
        })?;

        debug!(endpoint = %name, event_id = %queued.event_id, "Space call queued");

        let result_url = format!("{}/{}", call_url, queued.event_id);
        let mut request = self.client.get(&result_url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::BackendError(format!(
                "Space result stream {} returned {}",
                result_url, status
            )));
        }

        parse_event_stream(&response.text().await?)
    }
}

/// Extract the payload of the `complete` event from a finished SSE body
pub fn parse_event_stream(body: &str) -> Result<Value> {
    let mut event = String::new();
    let mut data = String::new();

    // A trailing blank line flushes the last event
    for line in body.lines().chain(std::iter::once("")) {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            match event.as_str() {
                "complete" => {
                    return Ok(serde_json::from_str(&data).unwrap_or(Value::String(data)));
                }
                "error" => {
                    let detail = if data.is_empty() || data == "null" {
                        "no details".to_string()
                    } else {
                        data
                    };
                    return Err(AppError::BackendError(format!(
                        "Space reported an error: {}",
                        detail
                    )));
                }
                _ => {}
            }
            event.clear();
            data.clear();
        } else if let Some(value) = line.strip_prefix("event:") {
            event = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(value.trim_start());
        }
    }

    Err(AppError::BackendError(
        "Space event stream ended without a result".to_string(),
    ))
}
