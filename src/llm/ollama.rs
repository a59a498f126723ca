//! Ollama HTTP backend
//!
//! Talks to a local Ollama server with non-streaming `/api/generate` calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{LlmBackend, LlmError};
use crate::config::LlmConfig;

/// HTTP client for a local Ollama server
#[derive(Clone)]
pub struct OllamaBackend {
    http: reqwest::Client,
    base_url: String,
    model: String,
    num_predict: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaBackend {
    /// Build the HTTP client from the `[llm]` config section
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            num_predict: config.num_predict,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Names of the models installed on the server (`GET /api/tags`)
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let resp = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let tags: TagsResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Envelope(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// True when the configured model appears in `/api/tags`.
    ///
    /// Ollama reports `llama3.2:latest` for a bare `llama3.2`, so an untagged
    /// name also matches its `:latest` form.
    pub async fn has_model(&self) -> Result<bool, LlmError> {
        let models = self.list_models().await?;
        let wanted = &self.model;
        let latest = format!("{wanted}:latest");
        Ok(models.iter().any(|m| m == wanted || *m == latest))
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature,
                num_predict: self.num_predict,
            },
        };

        debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            temperature,
            "Sending Ollama generate request"
        );

        let resp = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Envelope(e.to_string()))?;

        parsed
            .response
            .ok_or_else(|| LlmError::Envelope("missing 'response' field".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
