//! HTTP route definitions

use crate::api::handlers;
use crate::api::models::*;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ask Gateway API",
        version = "0.1.0",
        description = "Ask several text generation backends the same question in one call.",
        license(name = "MIT"),
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        handlers::ask_usage,
        handlers::ask,
        handlers::list_backends,
    ),
    components(schemas(
        AskRequest,
        AskResponse,
        BackendResult,
        UsageResponse,
        BackendInfo,
        BackendListResponse,
        ErrorResponse,
    )),
    tags(
        (name = "Ask", description = "Fan-out query endpoint"),
        (name = "Backends", description = "Backend inspection endpoints"),
    )
)]
pub struct ApiDoc;

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("Internal error: {}", detail) })),
    )
        .into_response()
}

/// Create the main application router
pub fn create_router(state: Arc<crate::AppState>) -> Router {
    let cors_enabled = state.settings.server.cors_enabled;

    let api_routes = Router::new()
        .route(
            "/ask",
            get(handlers::ask_usage)
                .post(handlers::ask)
                .fallback(handlers::method_not_allowed),
        )
        .route("/backends", get(handlers::list_backends));

    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
