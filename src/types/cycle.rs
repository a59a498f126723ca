//! Complete distribution-cycle document and multi-cycle summary
//!
//! `CycleResults` is what gets written to `cycle_<n>_<timestamp>.json` and
//! what the dashboards are rendered from, so its key layout is stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    AvailableResources, Coverage, DeliveryOutcome, DeliveryPlan, LessonsLearned, LoadingPlan,
    NeedsReport, OutcomeAnalysis, RouteSchedule, Scenario, TrendAnalysis, Zone, ZoneAllocation,
    ZoneAssessment,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementData {
    pub total_zones: usize,
    pub total_population: u64,
    pub zones_data: Vec<Zone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedsAssessmentSection {
    pub prioritized_zones: Vec<ZoneAssessment>,
    pub report: NeedsReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAllocationSection {
    pub allocations: Vec<ZoneAllocation>,
    pub coverage: Coverage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticsSection {
    pub delivery_plan: DeliveryPlan,
    pub schedule: Vec<RouteSchedule>,
    #[serde(default)]
    pub loading_plans: Vec<LoadingPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOutcomesSection {
    pub actual_results: Vec<DeliveryOutcome>,
    pub analysis: OutcomeAnalysis,
    #[serde(default)]
    pub lessons_learned: LessonsLearned,
}

/// Headline numbers used by the summary report and the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub zones_served: usize,
    pub success_rate: f64,
    pub population_served: u64,
    pub coverage_percentage: f64,
}

/// Everything produced by one distribution cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleResults {
    pub cycle_number: u32,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: f64,
    pub resource_scenario: Scenario,
    pub settlement_data: SettlementData,
    pub available_resources: AvailableResources,
    pub needs_assessment: NeedsAssessmentSection,
    pub resource_allocation: ResourceAllocationSection,
    pub logistics_plan: LogisticsSection,
    pub delivery_outcomes: DeliveryOutcomesSection,
    pub performance_metrics: PerformanceMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendAnalysis>,
}

/// Best-performing cycle reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestCycle {
    pub cycle_number: u32,
    pub success_rate: f64,
}

/// Roll-up across every cycle run so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub total_cycles_completed: usize,
    pub average_success_rate: f64,
    pub total_population_served: u64,
    pub best_cycle: BestCycle,
    pub summary: String,
}
