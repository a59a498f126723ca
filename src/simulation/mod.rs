//! Settlement Simulator
//!
//! Generates a seeded, reproducible refugee settlement: zones with
//! demographics, shortages and access conditions, plus the depot stock for a
//! supply scenario. Deliveries can be fed back so that later cycles see
//! reduced shortages.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Uniform;
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::storage::StorageError;
use crate::types::{
    Accessibility, AvailableResources, ResourceKind, RoadCondition, Scenario, SecurityLevel,
    Supplies, Zone,
};

pub mod delivery;

pub use delivery::simulate_execution;

// ============================================================================
// Generation Parameters
// ============================================================================

const ROAD_WEIGHTS: [(RoadCondition, f64); 3] = [
    (RoadCondition::Good, 0.3),
    (RoadCondition::Fair, 0.4),
    (RoadCondition::Poor, 0.3),
];

const ACCESS_WEIGHTS: [(Accessibility, f64); 3] = [
    (Accessibility::Easy, 0.4),
    (Accessibility::Moderate, 0.4),
    (Accessibility::Difficult, 0.2),
];

const SECURITY_WEIGHTS: [(SecurityLevel, f64); 3] = [
    (SecurityLevel::Safe, 0.6),
    (SecurityLevel::Caution, 0.3),
    (SecurityLevel::Risk, 0.1),
];

/// Shortage factor applied when food is delivered
const FOOD_RELIEF_FACTOR: f64 = 0.5;
/// Shortage factor applied when water is delivered
const WATER_RELIEF_FACTOR: f64 = 0.5;
/// Severity factor applied when medical kits are delivered
const MEDICAL_RELIEF_FACTOR: f64 = 0.6;

/// Medical severity above which a zone counts as high medical need
const HIGH_MEDICAL_NEED: f64 = 0.7;

/// Round to a fixed number of decimals
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Draw from a small weighted table
pub(crate) fn choose_weighted<T: Copy, R: Rng + ?Sized>(rng: &mut R, table: &[(T, f64)]) -> Option<T> {
    let dist = WeightedIndex::new(table.iter().map(|(_, w)| *w)).ok()?;
    table.get(dist.sample(rng)).map(|(v, _)| *v)
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64, decimals: i32) -> f64 {
    round_to(Uniform::new(low, high).sample(rng), decimals)
}

// ============================================================================
// Summary
// ============================================================================

/// Settlement-wide statistics printed at startup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementSummary {
    pub total_zones: usize,
    pub total_population: u64,
    pub average_food_shortage: f64,
    pub average_water_shortage: f64,
    pub high_medical_need_zones: usize,
    pub difficult_access_zones: usize,
}

// ============================================================================
// Simulator
// ============================================================================

/// Seeded settlement generator and zone state holder
pub struct SettlementSimulator {
    zones: Vec<Zone>,
    rng: StdRng,
}

impl SettlementSimulator {
    /// Generate `num_zones` zones from `seed`.
    ///
    /// Zone ids run `Z01`, `Z02`, ... and names `Sector A`, `Sector B`, ...
    /// Counts above 26 wrap the sector letter; config validation keeps runs
    /// within A-Z.
    pub fn new(num_zones: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let zones = (0..num_zones).map(|i| Self::generate_zone(i, &mut rng)).collect();
        Self { zones, rng }
    }

    fn generate_zone(index: usize, rng: &mut StdRng) -> Zone {
        let letter = char::from(b'A' + (index % 26) as u8);

        Zone {
            zone_id: format!("Z{:02}", index + 1),
            zone_name: format!("Sector {letter}"),
            population: rng.gen_range(500..3000),
            children_ratio: uniform(rng, 0.30, 0.50, 2),
            elderly_ratio: uniform(rng, 0.05, 0.15, 2),
            pregnant_women: rng.gen_range(10..50),
            chronic_illness_cases: rng.gen_range(20..100),

            food_shortage: uniform(rng, 0.3, 0.95, 2),
            water_shortage: uniform(rng, 0.2, 0.85, 2),
            medical_severity: uniform(rng, 0.2, 0.90, 2),
            shelter_damage: uniform(rng, 0.1, 0.70, 2),
            sanitation_need: uniform(rng, 0.3, 0.80, 2),

            distance_from_depot: uniform(rng, 1.0, 20.0, 1),
            road_condition: choose_weighted(rng, &ROAD_WEIGHTS).unwrap_or(RoadCondition::Fair),
            accessibility: choose_weighted(rng, &ACCESS_WEIGHTS).unwrap_or(Accessibility::Moderate),
            security_level: choose_weighted(rng, &SECURITY_WEIGHTS).unwrap_or(SecurityLevel::Safe),

            last_aid_received_days: rng.gen_range(1..30),
            previous_aid_satisfaction: uniform(rng, 0.5, 0.95, 2),

            latitude: uniform(rng, 30.0, 35.0, 4),
            longitude: uniform(rng, 40.0, 45.0, 4),
        }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.zone_id == zone_id)
    }

    /// Draw depot stock for one cycle.
    ///
    /// Consumables and budget scale with the scenario multiplier; vehicles and
    /// personnel do not.
    pub fn available_resources(&mut self, scenario: Scenario) -> AvailableResources {
        let mult = scenario.multiplier();
        let rng = &mut self.rng;
        let mut scaled = |low: u64, high: u64| -> u64 {
            (rng.gen_range(low..high) as f64 * mult).floor() as u64
        };

        let mut supplies = Supplies::default();
        supplies.set(ResourceKind::FoodPackages, scaled(5_000, 15_000));
        supplies.set(ResourceKind::WaterLiters, scaled(10_000, 30_000));
        supplies.set(ResourceKind::MedicalKits, scaled(200, 800));
        supplies.set(ResourceKind::ShelterMaterials, scaled(100, 500));
        supplies.set(ResourceKind::Blankets, scaled(1_000, 3_000));
        supplies.set(ResourceKind::HygieneKits, scaled(500, 1_500));

        let vehicles_available = self.rng.gen_range(5..12);
        let personnel_available = self.rng.gen_range(20..50);
        let budget_usd = (self.rng.gen_range(50_000u64..150_000) as f64 * mult).floor() as u64;

        AvailableResources {
            supplies,
            vehicles_available,
            personnel_available,
            budget_usd,
        }
    }

    /// Apply a completed delivery to a zone.
    ///
    /// Each shortage is reduced only when its kind was actually delivered.
    /// Returns false for an unknown zone.
    pub fn update_zone_after_delivery(&mut self, zone_id: &str, delivered: &Supplies) -> bool {
        let Some(zone) = self.zones.iter_mut().find(|z| z.zone_id == zone_id) else {
            warn!(zone_id = %zone_id, "Delivery update for unknown zone ignored");
            return false;
        };

        for kind in delivered.delivered_kinds() {
            match kind {
                ResourceKind::FoodPackages => zone.food_shortage *= FOOD_RELIEF_FACTOR,
                ResourceKind::WaterLiters => zone.water_shortage *= WATER_RELIEF_FACTOR,
                ResourceKind::MedicalKits => zone.medical_severity *= MEDICAL_RELIEF_FACTOR,
                _ => {}
            }
        }
        zone.last_aid_received_days = 0;

        debug!(
            zone_id = %zone_id,
            food = zone.food_shortage,
            water = zone.water_shortage,
            medical = zone.medical_severity,
            "Zone updated after delivery"
        );
        true
    }

    pub fn summary(&self) -> SettlementSummary {
        let n = self.zones.len();
        let mean = |f: fn(&Zone) -> f64| {
            if n == 0 {
                0.0
            } else {
                self.zones.iter().map(f).sum::<f64>() / n as f64
            }
        };

        SettlementSummary {
            total_zones: n,
            total_population: self.zones.iter().map(|z| u64::from(z.population)).sum(),
            average_food_shortage: mean(|z| z.food_shortage),
            average_water_shortage: mean(|z| z.water_shortage),
            high_medical_need_zones: self
                .zones
                .iter()
                .filter(|z| z.medical_severity > HIGH_MEDICAL_NEED)
                .count(),
            difficult_access_zones: self
                .zones
                .iter()
                .filter(|z| z.accessibility == Accessibility::Difficult)
                .count(),
        }
    }

    /// Write every zone as one CSV row with a header line
    pub fn export_zones_csv(&self, path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::Io(parent.to_path_buf(), e))?;
            }
        }
        let file = std::fs::File::create(path).map_err(|e| StorageError::Io(path.to_path_buf(), e))?;
        let mut writer = BufWriter::new(file);
        let io_err = |e| StorageError::Io(path.to_path_buf(), e);

        writeln!(
            writer,
            "zone_id,zone_name,population,children_ratio,elderly_ratio,pregnant_women,\
             chronic_illness_cases,food_shortage,water_shortage,medical_severity,shelter_damage,\
             sanitation_need,distance_from_depot,road_condition,accessibility,security_level,\
             last_aid_received_days,previous_aid_satisfaction,latitude,longitude"
        )
        .map_err(io_err)?;

        for z in &self.zones {
            writeln!(
                writer,
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                z.zone_id,
                z.zone_name,
                z.population,
                z.children_ratio,
                z.elderly_ratio,
                z.pregnant_women,
                z.chronic_illness_cases,
                z.food_shortage,
                z.water_shortage,
                z.medical_severity,
                z.shelter_damage,
                z.sanitation_need,
                z.distance_from_depot,
                z.road_condition,
                z.accessibility,
                z.security_level,
                z.last_aid_received_days,
                z.previous_aid_satisfaction,
                z.latitude,
                z.longitude,
            )
            .map_err(io_err)?;
        }
        writer.flush().map_err(io_err)?;

        info!(path = %path.display(), zones = self.zones.len(), "✓ Zone data exported");
        Ok(())
    }
}
