//! Delivery routes, schedules, and vehicle loading plans

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ResourceKind;

/// One vehicle route from the depot through a sequence of zones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRoute {
    #[serde(default, deserialize_with = "super::lenient::count")]
    pub route_id: u32,
    #[serde(default, deserialize_with = "super::lenient::count")]
    pub vehicle_number: u32,
    #[serde(default, deserialize_with = "super::lenient::string_list")]
    pub zones_sequence: Vec<String>,
    #[serde(default, deserialize_with = "super::lenient::string_list")]
    pub zone_names: Vec<String>,
    #[serde(default, deserialize_with = "super::lenient::number")]
    pub total_distance_km: f64,
    #[serde(default, deserialize_with = "super::lenient::number")]
    pub estimated_time_hours: f64,
    #[serde(default, deserialize_with = "super::lenient::text", skip_serializing_if = "String::is_empty")]
    pub road_conditions: String,
    #[serde(default, deserialize_with = "super::lenient::text", skip_serializing_if = "String::is_empty")]
    pub special_requirements: String,
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub delivery_notes: String,
}

/// Full logistics plan for a cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPlan {
    pub routes: Vec<DeliveryRoute>,
    #[serde(default, deserialize_with = "super::lenient::count")]
    pub total_vehicles_needed: u32,
    #[serde(default, deserialize_with = "super::lenient::number")]
    pub total_delivery_time_hours: f64,
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub estimated_completion: String,
    #[serde(default, deserialize_with = "super::lenient::text")]
    pub logistics_summary: String,
    #[serde(default, deserialize_with = "super::lenient::string_list")]
    pub potential_challenges: Vec<String>,
}

/// Planned stop at one zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneStop {
    pub sequence: u32,
    pub zone_id: String,
    /// `HH:MM`
    pub arrival_time: String,
    pub unloading_duration_minutes: u32,
    /// `HH:MM`
    pub departure_time: String,
}

/// Clock schedule for one route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSchedule {
    pub route_id: u32,
    pub start_time: String,
    pub zones: Vec<ZoneStop>,
    pub end_time: String,
}

/// Quantity and weight of one supply kind on a truck
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadedItem {
    pub quantity: u64,
    pub weight_kg: f64,
}

/// Cargo destined for one zone on a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneLoad {
    pub zone_id: String,
    pub zone_name: String,
    pub items: BTreeMap<ResourceKind, LoadedItem>,
    pub total_weight_kg: f64,
}

/// Whether a route's cargo fits the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WeightStatus {
    Ok,
    Overweight,
}

/// Loading plan for the vehicle serving one route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingPlan {
    pub route_id: u32,
    pub loading_sequence: Vec<ZoneLoad>,
    pub total_weight_kg: f64,
    pub capacity_used_percent: f64,
    pub weight_status: WeightStatus,
}
