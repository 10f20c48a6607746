//! Ask Gateway
//!
//! Sends one query to several text generation backends (a HuggingFace Space,
//! OpenAI, and a Gemini placeholder) and returns all of their answers in a
//! single JSON response.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;

pub use error::{AppError, Result};

use std::sync::Arc;

use backend::BackendRegistry;
use gateway::Dispatcher;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// Build state with the built-in backends registered from settings
    pub fn from_settings(settings: config::Settings) -> Result<Self> {
        let registry = Arc::new(BackendRegistry::from_settings(&settings)?);
        Ok(Self::with_registry(settings, registry))
    }

    /// Build state around an existing registry
    pub fn with_registry(settings: config::Settings, registry: Arc<BackendRegistry>) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(registry, &settings.dispatch));
        Self {
            settings: Arc::new(settings),
            dispatcher,
        }
    }
}
