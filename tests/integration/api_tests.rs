//! API endpoint integration tests

use ask_gateway::api::routes::create_router;
use ask_gateway::backend::{BackendRegistry, ModelBackend};
use ask_gateway::config::Settings;
use ask_gateway::AppState;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_app(settings: Settings) -> Router {
    let state = Arc::new(AppState::from_settings(settings).unwrap());
    create_router(state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/ask")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Settings whose every backend points at a server that must never be called
async fn settings_with_silent_upstream() -> (Settings, MockServer) {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut settings = Settings::default();
    settings.hf.space = Some(server.uri());
    settings.hf.space_url = Some(server.uri());
    settings.openai.base_url = server.uri();
    settings.gemini.endpoint = Some(server.uri());
    (settings, server)
}

#[tokio::test]
async fn test_get_returns_usage() {
    let (settings, _server) = settings_with_silent_upstream().await;
    let app = create_test_app(settings);

    let request = Request::builder().uri("/api/ask").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["note"].as_str().unwrap().contains("query"));
}

#[tokio::test]
async fn test_other_methods_are_rejected() {
    let app = create_test_app(Settings::default());

    for verb in ["PUT", "DELETE", "PATCH"] {
        let request = Request::builder()
            .method(verb)
            .uri("/api/ask")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app.clone(), request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"error": "Method not allowed, use POST"}));
    }
}

#[tokio::test]
async fn test_missing_query_is_bad_request() {
    let (settings, _server) = settings_with_silent_upstream().await;
    let app = create_test_app(settings);

    for body in [
        r#"{"models": ["hf"]}"#,
        r#"{"query": 12}"#,
        r#"{"query": ""}"#,
        "not json at all",
        "",
    ] {
        let (status, json) = send(app.clone(), post_json(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(json, json!({"error": "Body must be JSON with a \"query\" string"}));
    }
}

#[tokio::test]
async fn test_unknown_models_make_no_calls() {
    let (settings, _server) = settings_with_silent_upstream().await;
    let app = create_test_app(settings);

    let (status, body) = send(
        app,
        post_json(r#"{"query": "hi", "models": ["llama", "claude"]}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "hi");
    assert_eq!(
        body["results"],
        json!([
            {"model": "llama", "ok": false, "error": "unknown model"},
            {"model": "claude", "ok": false, "error": "unknown model"}
        ])
    );
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_openai_without_key_is_config_error() {
    let (settings, _server) = settings_with_silent_upstream().await;
    let app = create_test_app(settings);

    let (status, body) = send(app, post_json(r#"{"prompt": "hi", "models": ["openai"]}"#)).await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["model"], "openai");
    assert_eq!(results[0]["ok"], false);
    assert_eq!(results[0]["error"], "OPENAI_API_KEY is not set");
}

#[tokio::test]
async fn test_list_backends() {
    let mut settings = Settings::default();
    settings.openai.api_key = Some("sk-test".to_string());
    let app = create_test_app(settings);

    let request = Request::builder()
        .uri("/api/backends")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["backends"],
        json!([
            {"model": "gemini", "configured": false},
            {"model": "hf", "configured": false},
            {"model": "openai", "configured": true}
        ])
    );
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = create_test_app(Settings::default());

    let request = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/ask"].is_object());
}

/// Backend whose every call panics
struct PanickingBackend;

#[async_trait]
impl ModelBackend for PanickingBackend {
    fn name(&self) -> &str {
        "boom"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn ask(&self, _query: &str) -> ask_gateway::Result<String> {
        panic!("backend blew up");
    }
}

#[tokio::test]
async fn test_handler_panic_becomes_500_json() {
    let registry = Arc::new(BackendRegistry::new());
    registry.register(Arc::new(PanickingBackend));
    let app = create_router(Arc::new(AppState::with_registry(
        Settings::default(),
        registry,
    )));

    let (status, body) = send(app, post_json(r#"{"query": "hello", "models": ["boom"]}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Internal error"));
    assert!(error.contains("backend blew up"));
}
