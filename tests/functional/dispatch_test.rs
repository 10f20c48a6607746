//! Functional tests for request dispatch

use ask_gateway::backend::{BackendRegistry, ModelBackend};
use ask_gateway::config::DispatchConfig;
use ask_gateway::gateway::Dispatcher;
use ask_gateway::{AppError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Answers with its own name after a fixed delay and counts calls
struct FakeBackend {
    name: String,
    delay: Duration,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeBackend {
    fn new(name: &str, delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            delay: Duration::from_millis(delay_ms),
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            delay: Duration::ZERO,
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelBackend for FakeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn ask(&self, query: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(AppError::BackendError("upstream exploded".to_string()));
        }
        Ok(format!("{}: {}", self.name, query))
    }
}

fn create_dispatcher(backends: &[Arc<FakeBackend>]) -> Dispatcher {
    let registry = Arc::new(BackendRegistry::new());
    for backend in backends {
        registry.register(backend.clone());
    }
    Dispatcher::new(
        registry,
        &DispatchConfig {
            backend_timeout_ms: 2000,
        },
    )
}

fn models(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn test_results_follow_request_order() {
    // Slowest first, so completion order is the reverse of request order
    let slow = FakeBackend::new("slow", 200);
    let medium = FakeBackend::new("medium", 100);
    let fast = FakeBackend::new("fast", 0);
    let dispatcher = create_dispatcher(&[slow.clone(), medium.clone(), fast.clone()]);

    let results = dispatcher
        .dispatch("q", &models(&["slow", "medium", "fast"]))
        .await;

    let order: Vec<_> = results.iter().map(|r| r.model.as_str()).collect();
    assert_eq!(order, vec!["slow", "medium", "fast"]);
    assert_eq!(results[0].text.as_deref(), Some("slow: q"));
    assert_eq!(results[2].text.as_deref(), Some("fast: q"));
}

#[tokio::test]
async fn test_backends_run_concurrently() {
    let a = FakeBackend::new("a", 300);
    let b = FakeBackend::new("b", 300);
    let c = FakeBackend::new("c", 300);
    let dispatcher = create_dispatcher(&[a, b, c]);

    let started = Instant::now();
    let results = dispatcher.dispatch("q", &models(&["a", "b", "c"])).await;

    assert!(results.iter().all(|r| r.ok));
    assert!(started.elapsed() < Duration::from_millis(800));
}

#[tokio::test]
async fn test_unknown_model_makes_no_calls() {
    let known = FakeBackend::new("known", 0);
    let dispatcher = create_dispatcher(&[known.clone()]);

    let results = dispatcher.dispatch("q", &models(&["mystery"])).await;

    assert_eq!(results.len(), 1);
    assert!(!results[0].ok);
    assert_eq!(results[0].error.as_deref(), Some("unknown model"));
    assert!(results[0].text.is_none());
    assert_eq!(known.calls(), 0);
}

#[tokio::test]
async fn test_failure_is_isolated() {
    let good = FakeBackend::new("good", 50);
    let bad = FakeBackend::failing("bad");
    let dispatcher = create_dispatcher(&[good.clone(), bad.clone()]);

    let results = dispatcher.dispatch("q", &models(&["bad", "good"])).await;

    assert!(!results[0].ok);
    assert_eq!(
        results[0].error.as_deref(),
        Some("Backend error: upstream exploded")
    );
    assert!(results[1].ok);
    assert_eq!(bad.calls(), 1);
    assert_eq!(good.calls(), 1);
}

#[tokio::test]
async fn test_duplicate_models_are_each_asked() {
    let echo = FakeBackend::new("echo", 0);
    let dispatcher = create_dispatcher(&[echo.clone()]);

    let results = dispatcher
        .dispatch("q", &models(&["echo", "echo", "echo"]))
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(echo.calls(), 3);
}
