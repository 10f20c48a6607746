//! Backend module - trait, text generation clients, and registry

pub mod gemini_backend;
pub mod gradio;
pub mod hf_backend;
pub mod normalize;
pub mod openai_backend;
pub mod probe;
pub mod registry;
pub mod traits;

pub use gemini_backend::GeminiBackend;
pub use hf_backend::HfBackend;
pub use openai_backend::OpenAIBackend;
pub use probe::ProbeAttempt;
pub use registry::{BackendRegistry, BackendStatus};
pub use traits::ModelBackend;
