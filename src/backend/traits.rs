//! Backend trait definitions

use async_trait::async_trait;

use crate::error::Result;

/// A text generation service that can answer a single query
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Model identifier callers use to select this backend (`hf`, `openai`, ...)
    fn name(&self) -> &str;

    /// Whether the credentials or URLs this backend needs are present
    fn is_configured(&self) -> bool;

    /// Ask the backend and return its answer flattened to text
    async fn ask(&self, query: &str) -> Result<String>;
}
