//! Multi-agent system for aid distribution
//!
//! ## Cycle Agents
//!
//! - **NeedsAssessmentAgent** (Phase 2): priority score 0-100 per zone
//! - **ResourceAllocationAgent** (Phase 3): supplies per zone within stock
//! - **LogisticsCoordinatorAgent** (Phase 4): routes, schedule, vehicle loading
//! - **MonitorAdaptationAgent** (Phase 5): outcome analysis, trends, lessons
//! - **AidOrchestrator**: runs the phases in order and keeps cycle history
//!
//! Every agent asks the LLM first and falls back to a deterministic plan when
//! the reply cannot be used. With no backend (offline mode) the deterministic
//! plan is the only path.

pub mod needs_assessment;
pub mod resource_allocation;
pub mod logistics;
pub mod monitor;
pub mod orchestrator;

pub use needs_assessment::NeedsAssessmentAgent;
pub use resource_allocation::ResourceAllocationAgent;
pub use logistics::LogisticsCoordinatorAgent;
pub use monitor::MonitorAdaptationAgent;
pub use orchestrator::AidOrchestrator;

use std::sync::Arc;

use crate::llm::{LlmBackend, LlmError};

/// Trait shared by the four cycle agents
pub trait Agent: Send + Sync {
    /// Agent name for logs (e.g., "NeedsAssessment")
    fn name(&self) -> &'static str;

    /// Sampling temperature this agent requests
    fn temperature(&self) -> f32;

    /// Whether an LLM backend is attached
    fn is_online(&self) -> bool;
}

/// An optional LLM backend bound to one agent's temperature
#[derive(Clone)]
pub struct AgentLlm {
    backend: Option<Arc<dyn LlmBackend>>,
    temperature: f32,
}

impl AgentLlm {
    pub fn new(backend: Option<Arc<dyn LlmBackend>>, temperature: f32) -> Self {
        Self {
            backend,
            temperature,
        }
    }

    pub fn offline(temperature: f32) -> Self {
        Self::new(None, temperature)
    }

    pub fn is_online(&self) -> bool {
        self.backend.is_some()
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Send `prompt` to the backend.
    ///
    /// `Ok(None)` means offline; transport failures are returned as errors.
    pub async fn ask(&self, prompt: &str) -> Result<Option<String>, LlmError> {
        match &self.backend {
            Some(backend) => backend.generate(prompt, self.temperature).await.map(Some),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for AgentLlm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentLlm")
            .field("backend", &self.backend.as_ref().map(|b| b.backend_name()))
            .field("temperature", &self.temperature)
            .finish()
    }
}
