//! Shared test helpers: a scripted in-memory LLM backend.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use relief_ops::llm::{LlmBackend, LlmError};

type Responder = Box<dyn Fn(&str) -> Result<String, LlmError> + Send + Sync>;

/// Which agent a prompt came from, judged by its opening line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Needs,
    Allocation,
    Logistics,
    Monitor,
    Unknown,
}

pub fn prompt_kind(prompt: &str) -> PromptKind {
    if prompt.contains("needs assessment specialist") {
        PromptKind::Needs
    } else if prompt.contains("resource allocation optimizer") {
        PromptKind::Allocation
    } else if prompt.contains("logistics coordinator") {
        PromptKind::Logistics
    } else if prompt.contains("monitoring and evaluation specialist") {
        PromptKind::Monitor
    } else {
        PromptKind::Unknown
    }
}

/// First `"zone_id": "..."` value in a prompt
pub fn first_zone_id(prompt: &str) -> Option<String> {
    let start = prompt.find("\"zone_id\": \"")? + "\"zone_id\": \"".len();
    let end = prompt[start..].find('"')? + start;
    Some(prompt[start..end].to_string())
}

/// Backend that answers every prompt through a closure and records calls
pub struct ScriptedBackend {
    responder: Responder,
    calls: Mutex<Vec<(String, f32)>>,
}

impl ScriptedBackend {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Same reply for every prompt
    pub fn always(reply: &str) -> Arc<Self> {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    /// Every request fails as if the server were down
    pub fn unreachable() -> Arc<Self> {
        Self::new(|_| Err(LlmError::Envelope("connection refused".to_string())))
    }

    pub fn calls(&self) -> Vec<(String, f32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: PromptKind) -> usize {
        self.calls().iter().filter(|(p, _)| prompt_kind(p) == kind).count()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push((prompt.to_string(), temperature));
        (self.responder)(prompt)
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-test"
    }
}
