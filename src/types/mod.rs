//! Shared data structures for the aid distribution cycle
//!
//! This module defines the records passed between cycle phases:
//! - Phase 1: Zone, AvailableResources (settlement simulator)
//! - Phase 2: ZoneAssessment, NeedsReport (needs assessment agent)
//! - Phase 3: ZoneAllocation, Coverage (resource allocation agent)
//! - Phase 4: DeliveryPlan, RouteSchedule, LoadingPlan (logistics agent)
//! - Phase 5: DeliveryOutcome, OutcomeAnalysis, TrendAnalysis (monitor agent)
//! - Phase 6: CycleResults, SummaryReport (orchestrator)

mod zone;
mod resources;
mod assessment;
mod allocation;
mod logistics;
mod monitoring;
mod cycle;
pub mod lenient;

pub use zone::*;
pub use resources::*;
pub use assessment::*;
pub use allocation::*;
pub use logistics::*;
pub use monitoring::*;
pub use cycle::*;
