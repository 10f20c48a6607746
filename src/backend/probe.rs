//! Raw HTTP probing of a Space's predict endpoints
//!
//! Older or hand-rolled Spaces expose predict routes under different paths and
//! accept different payload shapes. The prober walks a fixed, ordered list of
//! (path, payload) candidates and stops at the first 2xx answer.

use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::backend::normalize::normalize_body;
use crate::error::{AppError, Result};

/// Longest error body kept per attempt
const MAX_ERROR_BODY: usize = 512;

pub const PROBE_PATHS: &[&str] = &[
    "/run/predict",
    "/run/predict/",
    "/api/predict",
    "/api/predict/",
    "/predict",
    "/predict/",
];

/// A named request body builder
#[derive(Clone, Copy)]
pub struct PayloadShape {
    pub name: &'static str,
    pub build: fn(&str) -> Value,
}

pub const PAYLOAD_SHAPES: &[PayloadShape] = &[
    PayloadShape { name: "data", build: data_payload },
    PayloadShape { name: "data+fn_index", build: indexed_data_payload },
    PayloadShape { name: "input", build: input_payload },
    PayloadShape { name: "inputs", build: inputs_payload },
    PayloadShape { name: "message", build: message_payload },
    PayloadShape { name: "text", build: text_payload },
];

fn data_payload(q: &str) -> Value {
    json!({ "data": [q] })
}

fn indexed_data_payload(q: &str) -> Value {
    json!({ "data": [q], "fn_index": 0 })
}

fn input_payload(q: &str) -> Value {
    json!({ "input": q })
}

fn inputs_payload(q: &str) -> Value {
    json!({ "inputs": q })
}

fn message_payload(q: &str) -> Value {
    json!({ "message": q })
}

fn text_payload(q: &str) -> Value {
    json!({ "text": q })
}

/// One failed probe, kept for diagnostics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeAttempt {
    pub url: String,
    pub payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeAttempt {
    pub fn outcome(&self) -> String {
        match (self.status, &self.error) {
            (Some(status), _) => status.to_string(),
            (None, Some(error)) => error.clone(),
            (None, None) => "no response".to_string(),
        }
    }
}

/// Position of a candidate in the (path, payload) cross product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    path: usize,
    shape: usize,
}

/// Walks predict candidates against one base URL
pub struct Prober {
    base_url: String,
    client: Client,
    token: Option<String>,
    last_hit: RwLock<Option<Candidate>>,
}

impl Prober {
    pub fn new(base_url: &str, client: Client, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token,
            last_hit: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Candidates in probing order; the last candidate that worked goes first
    fn candidates(&self) -> Vec<Candidate> {
        let mut order: Vec<Candidate> = (0..PROBE_PATHS.len())
            .flat_map(|path| (0..PAYLOAD_SHAPES.len()).map(move |shape| Candidate { path, shape }))
            .collect();

        if let Some(hit) = *self.last_hit.read() {
            order.retain(|c| *c != hit);
            order.insert(0, hit);
        }

        order
    }

    /// Try every candidate until one answers with a 2xx status
    pub async fn probe(&self, query: &str) -> Result<String> {
        let mut attempts = Vec::new();

        for candidate in self.candidates() {
            let url = format!("{}{}", self.base_url, PROBE_PATHS[candidate.path]);
            let shape = PAYLOAD_SHAPES[candidate.shape];

            let mut request = self.client.post(&url).json(&(shape.build)(query));
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    let status = response.status().as_u16();
                    match response.text().await {
                        Ok(body) => {
                            *self.last_hit.write() = Some(candidate);
                            info!(url = %url, payload = shape.name, "Predict probe succeeded");
                            return Ok(normalize_body(&body));
                        }
                        Err(e) => {
                            debug!(url = %url, payload = shape.name, error = %e, "Predict body unreadable");
                            attempts.push(ProbeAttempt {
                                url,
                                payload: shape.name.to_string(),
                                status: Some(status),
                                error: Some(truncate(&format!("unreadable body: {}", e))),
                            });
                        }
                    }
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    debug!(url = %url, payload = shape.name, status, "Predict probe rejected");
                    attempts.push(ProbeAttempt {
                        url,
                        payload: shape.name.to_string(),
                        status: Some(status),
                        error: Some(truncate(&body)),
                    });
                }
                Err(e) => {
                    debug!(url = %url, payload = shape.name, error = %e, "Predict probe failed");
                    attempts.push(ProbeAttempt {
                        url,
                        payload: shape.name.to_string(),
                        status: None,
                        error: Some(truncate(&e.to_string())),
                    });
                }
            }
        }

        Err(AppError::ProbeExhausted { attempts })
    }
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
