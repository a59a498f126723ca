//! Needs assessment outputs: per-zone priority and the cycle needs report

use serde::{Deserialize, Serialize};

/// Maximum points per rubric component
pub mod rubric {
    pub const VULNERABILITY_MAX: f64 = 25.0;
    pub const SHORTAGE_MAX: f64 = 35.0;
    pub const TIME_MAX: f64 = 20.0;
    pub const POPULATION_MAX: f64 = 10.0;
    pub const CONDITIONS_MAX: f64 = 10.0;
    pub const PRIORITY_MAX: f64 = 100.0;
}

/// Priority assessment for a single zone.
///
/// `zone_id`/`zone_name` are absent from LLM replies and are stamped on by the
/// agent after parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAssessment {
    #[serde(default)]
    pub zone_id: String,
    #[serde(default)]
    pub zone_name: String,
    /// 0-100, higher is more urgent
    #[serde(deserialize_with = "super::lenient::number")]
    pub priority_score: f64,
    #[serde(default, deserialize_with = "super::lenient::string_list")]
    pub critical_needs: Vec<String>,
    /// 0-25
    #[serde(default, deserialize_with = "super::lenient::number")]
    pub vulnerability_score: f64,
    /// 0-35
    #[serde(default, deserialize_with = "super::lenient::number")]
    pub shortage_score: f64,
    /// 0-20
    #[serde(default, deserialize_with = "super::lenient::number")]
    pub time_score: f64,
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub reasoning: String,
}

impl ZoneAssessment {
    /// Clamp every score into its rubric range
    pub fn clamp_scores(&mut self) {
        self.priority_score = self.priority_score.clamp(0.0, rubric::PRIORITY_MAX);
        self.vulnerability_score = self.vulnerability_score.clamp(0.0, rubric::VULNERABILITY_MAX);
        self.shortage_score = self.shortage_score.clamp(0.0, rubric::SHORTAGE_MAX);
        self.time_score = self.time_score.clamp(0.0, rubric::TIME_MAX);
    }
}

/// Compact zone reference used in reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityZoneRef {
    pub zone_id: String,
    pub zone_name: String,
    pub priority_score: f64,
}

impl From<&ZoneAssessment> for PriorityZoneRef {
    fn from(a: &ZoneAssessment) -> Self {
        Self {
            zone_id: a.zone_id.clone(),
            zone_name: a.zone_name.clone(),
            priority_score: a.priority_score,
        }
    }
}

/// One entry of the most-common-needs tally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedCount {
    pub need: String,
    pub count: usize,
}

/// Settlement-wide summary of a needs assessment pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedsReport {
    pub total_zones_assessed: usize,
    pub critical_zones: usize,
    pub high_priority_zones: usize,
    pub average_priority_score: f64,
    /// Up to five needs, most frequent first
    pub most_common_needs: Vec<NeedCount>,
    pub top_5_priority_zones: Vec<PriorityZoneRef>,
}
