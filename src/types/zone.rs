//! Settlement zone records and the categorical fields that describe them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Road surface between the depot and a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadCondition {
    Good,
    Fair,
    Poor,
}

impl RoadCondition {
    /// Typical loaded-truck speed on this surface (km/h)
    pub fn average_speed_kmh(self) -> f64 {
        match self {
            RoadCondition::Good => 40.0,
            RoadCondition::Fair => 25.0,
            RoadCondition::Poor => 15.0,
        }
    }
}

impl fmt::Display for RoadCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoadCondition::Good => write!(f, "good"),
            RoadCondition::Fair => write!(f, "fair"),
            RoadCondition::Poor => write!(f, "poor"),
        }
    }
}

/// Ease of reaching distribution points inside a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility {
    Easy,
    Moderate,
    Difficult,
}

impl fmt::Display for Accessibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessibility::Easy => write!(f, "easy"),
            Accessibility::Moderate => write!(f, "moderate"),
            Accessibility::Difficult => write!(f, "difficult"),
        }
    }
}

/// Security posture reported for a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Safe,
    Caution,
    Risk,
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityLevel::Safe => write!(f, "safe"),
            SecurityLevel::Caution => write!(f, "caution"),
            SecurityLevel::Risk => write!(f, "risk"),
        }
    }
}

/// Supply scenario at the distribution center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Abundant,
    #[default]
    Normal,
    Scarce,
}

impl Scenario {
    /// Multiplier applied to the consumable stock draws
    pub fn multiplier(self) -> f64 {
        match self {
            Scenario::Abundant => 1.5,
            Scenario::Normal => 1.0,
            Scenario::Scarce => 0.6,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Abundant => write!(f, "abundant"),
            Scenario::Normal => write!(f, "normal"),
            Scenario::Scarce => write!(f, "scarce"),
        }
    }
}

impl std::str::FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abundant" => Ok(Scenario::Abundant),
            "normal" => Ok(Scenario::Normal),
            "scarce" => Ok(Scenario::Scarce),
            other => Err(format!(
                "unknown scenario '{other}' (expected abundant, normal or scarce)"
            )),
        }
    }
}

/// One sector of the settlement.
///
/// Shortage indicators are on a 0-1 scale where higher means a worse shortage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub zone_id: String,
    pub zone_name: String,
    pub population: u32,
    pub children_ratio: f64,
    pub elderly_ratio: f64,
    pub pregnant_women: u32,
    pub chronic_illness_cases: u32,

    // === Need indicators ===
    pub food_shortage: f64,
    pub water_shortage: f64,
    pub medical_severity: f64,
    pub shelter_damage: f64,
    pub sanitation_need: f64,

    // === Logistics ===
    /// Road distance from the distribution center (km)
    pub distance_from_depot: f64,
    pub road_condition: RoadCondition,
    pub accessibility: Accessibility,
    pub security_level: SecurityLevel,

    // === History ===
    pub last_aid_received_days: u32,
    pub previous_aid_satisfaction: f64,

    pub latitude: f64,
    pub longitude: f64,
}

/// The logistics-relevant subset of a zone sent to the logistics agent
#[derive(Debug, Clone, Serialize)]
pub struct ZoneLogistics {
    pub zone_id: String,
    pub zone_name: String,
    pub distance_from_depot: f64,
    pub road_condition: RoadCondition,
    pub accessibility: Accessibility,
    pub security_level: SecurityLevel,
    pub population: u32,
}

impl From<&Zone> for ZoneLogistics {
    fn from(zone: &Zone) -> Self {
        Self {
            zone_id: zone.zone_id.clone(),
            zone_name: zone.zone_name.clone(),
            distance_from_depot: zone.distance_from_depot,
            road_condition: zone.road_condition,
            accessibility: zone.accessibility,
            security_level: zone.security_level,
            population: zone.population,
        }
    }
}
