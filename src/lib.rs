//! RELIEF-OPS: Aid Distribution Orchestration
//!
//! Multi-agent system that plans relief deliveries for a refugee settlement.
//!
//! ## Architecture
//!
//! - **Simulation**: Synthetic settlement zones, depot stock, delivery execution
//! - **Agents**: Needs assessment, resource allocation, logistics, monitoring
//! - **Orchestrator**: Runs the six-phase distribution cycle and tracks history
//! - **LLM Module**: Ollama backend plus reply cleaning and JSON extraction
//! - **Dashboard**: Plotly HTML pages for cycles and multi-cycle timelines

pub mod config;
pub mod types;
pub mod agents;
pub mod simulation;
pub mod llm;
pub mod storage;
pub mod dashboard;

// Re-export configuration
pub use config::{ConfigError, ReliefConfig};

// Re-export commonly used types
pub use types::{
    AvailableResources, CycleResults, DeliveryOutcome, DeliveryPlan, OutcomeAnalysis,
    ResourceKind, Scenario, SummaryReport, Supplies, Zone, ZoneAllocation, ZoneAssessment,
};

// Re-export agents
pub use agents::{
    AidOrchestrator, LogisticsCoordinatorAgent, MonitorAdaptationAgent, NeedsAssessmentAgent,
    ResourceAllocationAgent,
};

// Re-export LLM components
pub use llm::{LlmBackend, LlmError, OllamaBackend};

// Re-export simulation and storage
pub use simulation::SettlementSimulator;
pub use storage::StorageError;
