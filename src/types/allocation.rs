//! Resource allocation plans and coverage statistics

use serde::{Deserialize, Serialize};

use super::Supplies;

/// Supplies assigned to one zone for this cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAllocation {
    #[serde(default)]
    pub zone_id: String,
    #[serde(default)]
    pub zone_name: String,
    #[serde(default, deserialize_with = "super::lenient::number")]
    pub priority_score: f64,
    #[serde(flatten)]
    pub supplies: Supplies,
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub justification: String,
}

/// How much of the settlement this cycle's allocation reaches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub zones_served: usize,
    pub total_zones: usize,
    pub population_served: u64,
    pub total_population: u64,
    pub coverage_percentage: f64,
}

/// Allocated-versus-available figure for one supply kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindUtilisation {
    pub kind: super::ResourceKind,
    pub allocated: u64,
    pub available: u64,
    pub percentage: f64,
}
