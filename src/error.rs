//! Error types shared by handlers and backends

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::backend::ProbeAttempt;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Method not allowed, use POST")]
    MethodNotAllowed,

    /// A backend was asked for but its credentials or URL are missing
    #[error("{0}")]
    NotConfigured(String),

    #[error("unknown model")]
    UnknownModel(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("timed out after {0} ms")]
    Timeout(u64),

    #[error("{}", probe_summary(.attempts))]
    ProbeExhausted { attempts: Vec<ProbeAttempt> },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn probe_summary(attempts: &[ProbeAttempt]) -> String {
    match attempts.last() {
        Some(last) => format!(
            "All {} predict attempts failed (last: {} {} -> {})",
            attempts.len(),
            last.url,
            last.payload,
            last.outcome()
        ),
        None => "No predict attempts were made".to_string(),
    }
}

impl AppError {
    /// Diagnostic payload attached to a failed backend result
    pub fn debug(&self) -> Option<Value> {
        match self {
            AppError::ProbeExhausted { attempts } => serde_json::to_value(attempts).ok(),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::UnknownModel(_) => StatusCode::NOT_FOUND,
            AppError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::HttpClient(_) | AppError::BackendError(_) | AppError::ProbeExhausted { .. } => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
