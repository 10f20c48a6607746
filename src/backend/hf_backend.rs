//! HuggingFace Space backend
//!
//! Prefers a cached Gradio connection to `hf.space`; when that is not set, or
//! the Space cannot be reached, falls back to probing raw predict routes under
//! `hf.space_url`.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::backend::gradio::{resolve_space_url, GradioConnection};
use crate::backend::normalize::normalize_reply;
use crate::backend::probe::Prober;
use crate::backend::traits::ModelBackend;
use crate::config::HfConfig;
use crate::error::{AppError, Result};

pub struct HfBackend {
    space: Option<String>,
    api_name: String,
    token: Option<String>,
    client: Client,
    retry_delay: Duration,
    total_budget_ms: u64,
    connection: OnceCell<Arc<GradioConnection>>,
    connect_attempts: AtomicUsize,
    prober: Option<Prober>,
}

impl HfBackend {
    pub fn new(config: &HfConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let prober = config
            .space_url
            .as_deref()
            .map(|url| Prober::new(url, client.clone(), config.token.clone()));

        Ok(Self {
            space: config.space.clone(),
            api_name: config.api_name.clone(),
            token: config.token.clone(),
            client,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            total_budget_ms: config.total_budget_ms,
            connection: OnceCell::new(),
            connect_attempts: AtomicUsize::new(0),
            prober,
        })
    }

    /// How many times a Space connection has been attempted
    pub fn connection_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    async fn connect_once(&self, base_url: &str) -> Result<GradioConnection> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
        GradioConnection::connect(base_url, self.client.clone(), self.token.clone()).await
    }

    /// Shared connection; callers arriving mid-connect wait on the same attempt
    async fn connection(&self, space: &str) -> Result<Arc<GradioConnection>> {
        let base_url = resolve_space_url(space)?;

        self.connection
            .get_or_try_init(|| async {
                match self.connect_once(&base_url).await {
                    Ok(conn) => Ok(Arc::new(conn)),
                    Err(e) => {
                        warn!(url = %base_url, error = %e, "Space connection failed, retrying once");
                        tokio::time::sleep(self.retry_delay).await;
                        self.connect_once(&base_url).await.map(Arc::new)
                    }
                }
            })
            .await
            .cloned()
    }

    async fn ask_space(&self, space: &str, query: &str) -> Result<String> {
        let conn = self.connection(space).await?;
        let reply = conn.predict(&self.api_name, query).await?;
        debug!(url = %conn.base_url(), "Space replied");
        Ok(normalize_reply(&reply))
    }

    async fn ask_with_fallback(&self, query: &str) -> Result<String> {
        match (self.space.as_deref(), &self.prober) {
            (None, None) => Err(AppError::NotConfigured(
                "HF_SPACE or HF_SPACE_URL must be set".to_string(),
            )),
            (None, Some(prober)) => prober.probe(query).await,
            (Some(space), None) => self.ask_space(space, query).await,
            (Some(space), Some(prober)) => {
                // Half the budget stays reserved for probing
                let share_ms = self.space_share_ms();
                let reply = tokio::time::timeout(
                    Duration::from_millis(share_ms),
                    self.ask_space(space, query),
                )
                .await
                .unwrap_or(Err(AppError::Timeout(share_ms)));

                match reply {
                    Ok(text) => Ok(text),
                    Err(e) => {
                        warn!(
                            error = %e,
                            fallback = %prober.base_url(),
                            "Space call failed, probing predict routes"
                        );
                        prober.probe(query).await
                    }
                }
            }
        }
    }

    /// Time the Space client may use before probing takes over
    fn space_share_ms(&self) -> u64 {
        (self.total_budget_ms / 2).max(1)
    }
}

#[async_trait]
impl ModelBackend for HfBackend {
    fn name(&self) -> &str {
        "hf"
    }

    fn is_configured(&self) -> bool {
        self.space.is_some() || self.prober.is_some()
    }

    async fn ask(&self, query: &str) -> Result<String> {
        let budget = Duration::from_millis(self.total_budget_ms);
        tokio::time::timeout(budget, self.ask_with_fallback(query))
            .await
            .map_err(|_| AppError::Timeout(self.total_budget_ms))?
    }
}
