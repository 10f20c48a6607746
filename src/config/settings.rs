//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Plain environment variables recognized in addition to `ASK_GATEWAY__*` overrides
const PLAIN_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("HF_SPACE", "hf.space"),
    ("HF_SPACE_URL", "hf.space_url"),
    ("HF_TOKEN", "hf.token"),
    ("OPENAI_API_KEY", "openai.api_key"),
    ("OPENAI_MODEL", "openai.model"),
    ("GOOGLE_API_ENDPOINT", "gemini.endpoint"),
];

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub dispatch: DispatchConfig,
    pub hf: HfConfig,
    pub openai: OpenAIConfig,
    pub gemini: GeminiConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Fan-out configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Upper bound for a single model's call, whatever the backend does internally
    #[serde(default = "default_backend_timeout")]
    pub backend_timeout_ms: u64,
}

fn default_backend_timeout() -> u64 {
    30000
}

/// HuggingFace Space configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HfConfig {
    /// `owner/space-name`, or a full Space URL
    #[serde(default)]
    pub space: Option<String>,
    /// Base URL used for raw predict probing
    #[serde(default)]
    pub space_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_api_name")]
    pub api_name: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_total_budget")]
    pub total_budget_ms: u64,
}

fn default_api_name() -> String {
    "/chat".to_string()
}

fn default_request_timeout() -> u64 {
    20000
}

fn default_retry_delay() -> u64 {
    500
}

fn default_total_budget() -> u64 {
    25000
}

/// OpenAI Chat Completions configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAIConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub timeout_ms: u64,
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Gemini / Google placeholder configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub timeout_ms: u64,
}

impl Settings {
    /// Load settings from configuration files and the process environment
    pub fn load() -> Result<Self> {
        let env: Map<String, String> = std::env::vars().collect();
        Self::load_from_path("config/gateway.yaml", &env)
    }

    /// Load settings from a configuration file and an explicit environment map
    pub fn load_from_path<P: AsRef<Path>>(path: P, env: &Map<String, String>) -> Result<Self> {
        let path = path.as_ref();

        let format = if path.extension().map_or(false, |ext| ext == "yaml" || ext == "yml") {
            FileFormat::Yaml
        } else {
            FileFormat::Toml
        };

        let mut builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("server.cors_enabled", true)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            .set_default("dispatch.backend_timeout_ms", default_backend_timeout() as i64)?
            .set_default("hf.api_name", default_api_name())?
            .set_default("hf.request_timeout_ms", default_request_timeout() as i64)?
            .set_default("hf.retry_delay_ms", default_retry_delay() as i64)?
            .set_default("hf.total_budget_ms", default_total_budget() as i64)?
            .set_default("openai.model", default_openai_model())?
            .set_default("openai.base_url", default_openai_base_url())?
            .set_default("openai.timeout_ms", default_request_timeout() as i64)?
            .set_default("gemini.timeout_ms", default_request_timeout() as i64)?;

        if path.exists() {
            builder = builder.add_source(File::from(path).format(format));
        }

        builder = builder.add_source(
            Environment::with_prefix("ASK_GATEWAY")
                .separator("__")
                .try_parsing(true)
                .source(Some(env.clone())),
        );

        for (var, key) in PLAIN_ENV_OVERRIDES {
            let value = env.get(*var).filter(|v| !v.trim().is_empty()).cloned();
            builder = builder.set_override_option(*key, value)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }

        let timeouts = [
            ("dispatch.backend_timeout_ms", self.dispatch.backend_timeout_ms),
            ("hf.request_timeout_ms", self.hf.request_timeout_ms),
            ("hf.total_budget_ms", self.hf.total_budget_ms),
            ("openai.timeout_ms", self.openai.timeout_ms),
            ("gemini.timeout_ms", self.gemini.timeout_ms),
        ];
        for (key, value) in timeouts {
            if value == 0 {
                return Err(invalid(&format!("{} must be greater than 0", key)));
            }
        }

        if self.openai.model.trim().is_empty() {
            return Err(invalid("openai.model cannot be empty"));
        }

        if !self.hf.api_name.starts_with('/') {
            return Err(invalid("hf.api_name must start with '/'"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                cors_enabled: true,
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
            dispatch: DispatchConfig {
                backend_timeout_ms: default_backend_timeout(),
            },
            hf: HfConfig::default(),
            openai: OpenAIConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Default for HfConfig {
    fn default() -> Self {
        Self {
            space: None,
            space_url: None,
            token: None,
            api_name: default_api_name(),
            request_timeout_ms: default_request_timeout(),
            retry_delay_ms: default_retry_delay(),
            total_budget_ms: default_total_budget(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            base_url: default_openai_base_url(),
            timeout_ms: default_request_timeout(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: default_request_timeout(),
        }
    }
}
