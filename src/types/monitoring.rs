//! Delivery outcomes, outcome analysis, cross-cycle trends, lessons learned

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::Supplies;
use crate::config::ThresholdConfig;

/// Field disruption encountered during a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChallenge {
    None,
    WeatherDelay,
    RoadConditions,
    SecurityConcern,
    VehicleBreakdown,
}

impl DeliveryChallenge {
    pub const ALL: [DeliveryChallenge; 5] = [
        DeliveryChallenge::None,
        DeliveryChallenge::WeatherDelay,
        DeliveryChallenge::RoadConditions,
        DeliveryChallenge::SecurityConcern,
        DeliveryChallenge::VehicleBreakdown,
    ];

    /// Relative likelihood of each challenge
    pub fn probability(self) -> f64 {
        match self {
            DeliveryChallenge::None => 0.65,
            DeliveryChallenge::WeatherDelay => 0.15,
            DeliveryChallenge::RoadConditions => 0.10,
            DeliveryChallenge::SecurityConcern => 0.07,
            DeliveryChallenge::VehicleBreakdown => 0.03,
        }
    }

    /// Multiplier applied to the base delivery success
    pub fn success_factor(self) -> f64 {
        match self {
            DeliveryChallenge::None => 1.0,
            DeliveryChallenge::WeatherDelay => 0.95,
            DeliveryChallenge::RoadConditions => 0.85,
            DeliveryChallenge::SecurityConcern => 0.80,
            DeliveryChallenge::VehicleBreakdown => 0.75,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryChallenge::None => "none",
            DeliveryChallenge::WeatherDelay => "weather_delay",
            DeliveryChallenge::RoadConditions => "road_conditions",
            DeliveryChallenge::SecurityConcern => "security_concern",
            DeliveryChallenge::VehicleBreakdown => "vehicle_breakdown",
        }
    }
}

impl fmt::Display for DeliveryChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion class of a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Complete,
    Partial,
    Incomplete,
}

impl DeliveryStatus {
    /// Classify a 0-100 delivered percentage against the configured bands.
    ///
    /// Uses the same cutoffs as the monitor's delivery buckets, so a zone is
    /// `Complete` exactly when it is counted as fully delivered.
    pub fn classify(delivered_percentage: f64, thresholds: &ThresholdConfig) -> Self {
        if delivered_percentage >= thresholds.full_delivery_percent {
            DeliveryStatus::Complete
        } else if delivered_percentage >= thresholds.partial_delivery_percent {
            DeliveryStatus::Partial
        } else {
            DeliveryStatus::Incomplete
        }
    }
}

/// What actually reached one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub zone_id: String,
    pub zone_name: String,
    pub planned_delivery: Supplies,
    /// 0-100, one decimal
    pub delivered_percentage: f64,
    pub challenges: DeliveryChallenge,
    pub delivery_status: DeliveryStatus,
}

/// Zone-level shortfall flagged by the monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalGap {
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub zone_id: String,
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub gap_description: String,
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub urgency: String,
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub recommended_action: String,
}

/// Systemic issue identified across deliveries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeReport {
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub challenge_type: String,
    #[serde(default, deserialize_with = "super::lenient::count")]
    pub zones_affected: u32,
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub impact: String,
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub mitigation: String,
}

/// Supplies the monitor wants re-sent next cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReallocationRequest {
    #[serde(default, deserialize_with = "super::lenient::string_list")]
    pub zones: Vec<String>,
    #[serde(default)]
    pub resources_needed: Supplies,
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub reason: String,
}

/// Post-delivery analysis for one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeAnalysis {
    #[serde(deserialize_with = "super::lenient::number")]
    pub overall_success_rate: f64,
    #[serde(default, deserialize_with = "super::lenient::string_list")]
    pub zones_fully_served: Vec<String>,
    #[serde(default, deserialize_with = "super::lenient::string_list")]
    pub zones_partially_served: Vec<String>,
    #[serde(default, deserialize_with = "super::lenient::string_list")]
    pub zones_requiring_followup: Vec<String>,
    #[serde(default)]
    pub critical_gaps: Vec<CriticalGap>,
    #[serde(default)]
    pub challenges_identified: Vec<ChallengeReport>,
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub performance_insights: String,
    #[serde(default, deserialize_with = "super::lenient::string_list")]
    pub recommendations_next_cycle: Vec<String>,
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub priority_adjustments: String,
    #[serde(default)]
    pub resource_reallocation_needed: ReallocationRequest,
}

/// Deterministic outcome buckets computed before any LLM call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeBuckets {
    pub fully_delivered: Vec<String>,
    pub partially_delivered: Vec<String>,
    pub under_delivered: Vec<String>,
    /// Count per challenge, `none` excluded
    pub challenges_encountered: BTreeMap<DeliveryChallenge, usize>,
}

/// Direction of performance across cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    FirstCycle,
    Improving,
    Stable,
    Declining,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::FirstCycle => write!(f, "first_cycle"),
            Trend::Improving => write!(f, "improving"),
            Trend::Stable => write!(f, "stable"),
            Trend::Declining => write!(f, "declining"),
        }
    }
}

/// Current-cycle performance relative to earlier cycles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub trend: Trend,
    pub current_success_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_previous_rate: Option<f64>,
    pub improvement_percentage: f64,
    pub total_cycles_completed: usize,
    /// 1-based position of the best cycle among those compared
    pub best_cycle_position: usize,
    pub best_success_rate: f64,
    pub message: String,
}

/// Narrative takeaways from an outcome analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonsLearned {
    pub successes: Vec<String>,
    pub challenges: Vec<String>,
    pub best_practices: Vec<String>,
    pub areas_for_improvement: Vec<String>,
}
