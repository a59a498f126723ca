//! LLM Backend Module
//!
//! Provides a unified interface for the text-generation backend the agents
//! talk to.
//!
//! ## Architecture
//!
//! - **OllamaBackend**: HTTP client for a local Ollama server (`/api/generate`)
//! - **parsing**: helpers that pull JSON out of free-form model replies
//!
//! Every agent holds an `Option<Arc<dyn LlmBackend>>`. `None` means offline
//! mode, where the agent answers with its deterministic plan instead.

use async_trait::async_trait;

mod ollama;
pub mod parsing;

pub use ollama::OllamaBackend;

/// Transport-level LLM failures.
///
/// Malformed JSON inside a successful reply is not an error here; agents
/// detect that while parsing and fall back.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("LLM server returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Malformed LLM response envelope: {0}")]
    Envelope(String),
}

/// Unified trait for LLM backends
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a completion for `prompt` at the given sampling temperature
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, LlmError>;

    /// Get the backend name for logging
    fn backend_name(&self) -> &'static str;

    /// Model identifier used for requests
    fn model(&self) -> &str;
}
