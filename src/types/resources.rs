//! Supply kinds, quantity bundles, and depot stock

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relief supply categories handled by the distribution center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    FoodPackages,
    WaterLiters,
    MedicalKits,
    ShelterMaterials,
    Blankets,
    HygieneKits,
}

impl ResourceKind {
    /// All kinds in canonical order
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::FoodPackages,
        ResourceKind::WaterLiters,
        ResourceKind::MedicalKits,
        ResourceKind::ShelterMaterials,
        ResourceKind::Blankets,
        ResourceKind::HygieneKits,
    ];

    /// JSON key / display name
    pub fn key(self) -> &'static str {
        match self {
            ResourceKind::FoodPackages => "food_packages",
            ResourceKind::WaterLiters => "water_liters",
            ResourceKind::MedicalKits => "medical_kits",
            ResourceKind::ShelterMaterials => "shelter_materials",
            ResourceKind::Blankets => "blankets",
            ResourceKind::HygieneKits => "hygiene_kits",
        }
    }

    /// Shipping weight per unit (kg)
    pub fn unit_weight_kg(self) -> f64 {
        match self {
            ResourceKind::FoodPackages => 0.5,
            ResourceKind::WaterLiters => 1.0,
            ResourceKind::MedicalKits => 2.0,
            ResourceKind::ShelterMaterials => 15.0,
            ResourceKind::Blankets => 1.5,
            ResourceKind::HygieneKits => 3.0,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Quantities of each supply kind.
///
/// Serialized flat (one key per kind) so it can be embedded in allocation
/// and stock records with `#[serde(flatten)]`. Quantities coming back from an
/// LLM are read leniently: floats are rounded, negatives become zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplies {
    #[serde(default, deserialize_with = "super::lenient::quantity")]
    pub food_packages: u64,
    #[serde(default, deserialize_with = "super::lenient::quantity")]
    pub water_liters: u64,
    #[serde(default, deserialize_with = "super::lenient::quantity")]
    pub medical_kits: u64,
    #[serde(default, deserialize_with = "super::lenient::quantity")]
    pub shelter_materials: u64,
    #[serde(default, deserialize_with = "super::lenient::quantity")]
    pub blankets: u64,
    #[serde(default, deserialize_with = "super::lenient::quantity")]
    pub hygiene_kits: u64,
}

impl Supplies {
    pub fn get(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::FoodPackages => self.food_packages,
            ResourceKind::WaterLiters => self.water_liters,
            ResourceKind::MedicalKits => self.medical_kits,
            ResourceKind::ShelterMaterials => self.shelter_materials,
            ResourceKind::Blankets => self.blankets,
            ResourceKind::HygieneKits => self.hygiene_kits,
        }
    }

    pub fn set(&mut self, kind: ResourceKind, quantity: u64) {
        match kind {
            ResourceKind::FoodPackages => self.food_packages = quantity,
            ResourceKind::WaterLiters => self.water_liters = quantity,
            ResourceKind::MedicalKits => self.medical_kits = quantity,
            ResourceKind::ShelterMaterials => self.shelter_materials = quantity,
            ResourceKind::Blankets => self.blankets = quantity,
            ResourceKind::HygieneKits => self.hygiene_kits = quantity,
        }
    }

    /// Iterate `(kind, quantity)` in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, u64)> + '_ {
        ResourceKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    /// Kinds with a non-zero quantity
    pub fn delivered_kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.iter().filter(|(_, q)| *q > 0).map(|(k, _)| k)
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, q)| q == 0)
    }

    /// Total shipping weight (kg)
    pub fn weight_kg(&self) -> f64 {
        self.iter()
            .map(|(k, q)| q as f64 * k.unit_weight_kg())
            .sum()
    }

    /// Element-wise sum
    pub fn add(&mut self, other: &Supplies) {
        for kind in ResourceKind::ALL {
            self.set(kind, self.get(kind).saturating_add(other.get(kind)));
        }
    }
}

/// Stock on hand at the distribution center for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableResources {
    #[serde(flatten)]
    pub supplies: Supplies,
    pub vehicles_available: u32,
    pub personnel_available: u32,
    pub budget_usd: u64,
}
