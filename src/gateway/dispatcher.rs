//! Request dispatcher
//!
//! Every requested model gets its own call, all calls run concurrently, and
//! results come back in the order the models were requested. A failing or slow
//! backend only ever affects its own entry.

use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::api::models::BackendResult;
use crate::backend::BackendRegistry;
use crate::config::DispatchConfig;
use crate::error::AppError;

pub struct Dispatcher {
    registry: Arc<BackendRegistry>,
    backend_timeout_ms: u64,
}

impl Dispatcher {
    pub fn new(registry: Arc<BackendRegistry>, config: &DispatchConfig) -> Self {
        Self {
            registry,
            backend_timeout_ms: config.backend_timeout_ms,
        }
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    /// Ask every model and collect one result per entry, in input order
    pub async fn dispatch(&self, query: &str, models: &[String]) -> Vec<BackendResult> {
        let request_id = Uuid::new_v4();
        let span = info_span!("dispatch", %request_id, models = ?models);

        async move {
            let started = Instant::now();
            let results = join_all(models.iter().map(|model| self.call(model, query))).await;

            let ok = results.iter().filter(|r| r.ok).count();
            info!(
                ok,
                failed = results.len() - ok,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Dispatch completed"
            );
            results
        }
        .instrument(span)
        .await
    }

    async fn call(&self, model: &str, query: &str) -> BackendResult {
        let backend = match self.registry.resolve(model) {
            Ok(backend) => backend,
            Err(e) => {
                warn!(model = %model, "Unknown model requested");
                return BackendResult::failure(model, &e);
            }
        };

        let limit = Duration::from_millis(self.backend_timeout_ms);
        let outcome = tokio::time::timeout(limit, backend.ask(query))
            .await
            .unwrap_or(Err(AppError::Timeout(self.backend_timeout_ms)));

        match outcome {
            Ok(text) => {
                info!(model = %model, chars = text.len(), "Backend answered");
                BackendResult::success(model, text)
            }
            Err(e) => {
                warn!(model = %model, error = %e, "Backend failed");
                BackendResult::failure(model, &e)
            }
        }
    }
}
