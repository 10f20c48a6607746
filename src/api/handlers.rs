//! HTTP request handlers

use crate::api::models::{
    AskRequest, AskResponse, BackendInfo, BackendListResponse, ErrorResponse, UsageResponse,
};
use crate::error::AppError;
use crate::AppState;
use axum::{body::Bytes, extract::State, Json};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::info;

pub const USAGE_NOTE: &str = "POST JSON {\"query\": \"...\", \"models\": [\"hf\", \"openai\", \"gemini\"]} to this endpoint; models defaults to [\"hf\"]";

/// Health and usage information
#[utoipa::path(
    get,
    path = "/api/ask",
    tag = "Ask",
    responses((status = 200, description = "Service is up", body = UsageResponse))
)]
pub async fn ask_usage() -> Json<UsageResponse> {
    Json(UsageResponse {
        status: "ok".to_string(),
        note: USAGE_NOTE.to_string(),
    })
}

/// Send one query to every requested backend
#[utoipa::path(
    post,
    path = "/api/ask",
    tag = "Ask",
    request_body = AskRequest,
    responses(
        (status = 200, description = "One result per requested model, in order", body = AskResponse),
        (status = 400, description = "Body is not JSON or has no query string", body = ErrorResponse)
    )
)]
pub async fn ask(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<AskResponse>, AppError> {
    let request = AskRequest::from_bytes(&body)?;

    info!(
        query_len = request.query.len(),
        models = ?request.models,
        "Received ask request"
    );

    let results = state
        .dispatcher
        .dispatch(&request.query, &request.models)
        .await;

    Ok(Json(AskResponse {
        query: request.query,
        results,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

/// Any method other than GET or POST on the ask endpoint
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// List registered backends and whether they are configured
#[utoipa::path(
    get,
    path = "/api/backends",
    tag = "Backends",
    responses((status = 200, description = "Registered backends", body = BackendListResponse))
)]
pub async fn list_backends(State(state): State<Arc<AppState>>) -> Json<BackendListResponse> {
    let backends = state
        .dispatcher
        .registry()
        .list_backends()
        .into_iter()
        .map(|b| BackendInfo {
            model: b.model,
            configured: b.configured,
        })
        .collect();

    Json(BackendListResponse { backends })
}
