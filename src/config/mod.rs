//! Configuration module

mod settings;

pub use settings::{
    DispatchConfig, GeminiConfig, HfConfig, LoggingConfig, OpenAIConfig, ServerConfig, Settings,
};
