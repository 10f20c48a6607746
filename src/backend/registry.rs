//! Registry mapping model identifiers to backends

use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

use crate::backend::gemini_backend::GeminiBackend;
use crate::backend::hf_backend::HfBackend;
use crate::backend::openai_backend::OpenAIBackend;
use crate::backend::traits::ModelBackend;
use crate::config::Settings;
use crate::error::{AppError, Result};

/// Registration state of one backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStatus {
    pub model: String,
    pub configured: bool,
}

pub struct BackendRegistry {
    backends: DashMap<String, Arc<dyn ModelBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: DashMap::new(),
        }
    }

    /// Register the built-in backends. Unconfigured ones are still registered so
    /// that asking them yields a configuration error rather than `unknown model`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let registry = Self::new();
        registry.register(Arc::new(HfBackend::new(&settings.hf)?));
        registry.register(Arc::new(OpenAIBackend::new(&settings.openai)?));
        registry.register(Arc::new(GeminiBackend::new(&settings.gemini)?));
        Ok(registry)
    }

    /// Add a backend, replacing any previous one with the same name
    pub fn register(&self, backend: Arc<dyn ModelBackend>) {
        let name = backend.name().to_string();
        let configured = backend.is_configured();
        if self.backends.insert(name.clone(), backend).is_some() {
            info!(model = %name, "Replaced backend");
        } else {
            info!(model = %name, configured, "Registered backend");
        }
    }

    pub fn get(&self, model: &str) -> Option<Arc<dyn ModelBackend>> {
        self.backends.get(model).map(|b| b.value().clone())
    }

    /// Look up a backend, failing with `unknown model` when absent
    pub fn resolve(&self, model: &str) -> Result<Arc<dyn ModelBackend>> {
        self.get(model)
            .ok_or_else(|| AppError::UnknownModel(model.to_string()))
    }

    /// All backends, sorted by model identifier
    pub fn list_backends(&self) -> Vec<BackendStatus> {
        let mut statuses: Vec<BackendStatus> = self
            .backends
            .iter()
            .map(|entry| BackendStatus {
                model: entry.key().clone(),
                configured: entry.value().is_configured(),
            })
            .collect();
        statuses.sort_by(|a, b| a.model.cmp(&b.model));
        statuses
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn contains(&self, model: &str) -> bool {
        self.backends.contains_key(model)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
