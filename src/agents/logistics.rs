//! Logistics Coordinator Agent - Phase 4
//!
//! Groups allocated zones into vehicle routes, then derives a clock schedule
//! and a per-route loading plan. Routes proposed by the model are trimmed to
//! the allocated zones; zones the model forgot are routed by the fallback
//! planner so that every allocation has a vehicle.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

use super::{Agent, AgentLlm};
use crate::config::{defaults, LogisticsConfig, ReliefConfig};
use crate::llm::parsing::{parse_reply, preview};
use crate::llm::{LlmBackend, LlmError};
use crate::simulation::round_to;
use crate::types::{
    DeliveryPlan, DeliveryRoute, LoadedItem, LoadingPlan, RoadCondition, RouteSchedule,
    SecurityLevel, WeightStatus, Zone, ZoneAllocation, ZoneLoad, ZoneLogistics, ZoneStop,
};

/// Format hours-after-midnight as `HH:MM`, flooring to the minute.
///
/// Times past midnight keep counting (`25:30`) rather than wrapping.
pub fn format_clock(hours: f64) -> String {
    let minutes = (hours.max(0.0) * 60.0 + 1e-6).floor() as u64;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Logistics coordinator agent
#[derive(Debug, Clone)]
pub struct LogisticsCoordinatorAgent {
    llm: AgentLlm,
    cfg: LogisticsConfig,
}

impl LogisticsCoordinatorAgent {
    pub fn new(backend: Option<Arc<dyn LlmBackend>>, config: &ReliefConfig) -> Self {
        Self {
            llm: AgentLlm::new(backend, config.llm.temperatures.logistics),
            cfg: config.logistics.clone(),
        }
    }

    pub fn build_prompt(&self, allocations: &[ZoneAllocation], zone_logistics: &[ZoneLogistics]) -> String {
        let allocations_json = serde_json::to_string_pretty(allocations).unwrap_or_default();
        let logistics_json = serde_json::to_string_pretty(zone_logistics).unwrap_or_default();

        format!(
            "You are an expert logistics coordinator for humanitarian aid operations.\n\
             Plan efficient delivery routes considering real-world constraints.\n\
             \n\
             RESOURCE ALLOCATIONS TO DELIVER:\n\
             {allocations_json}\n\
             \n\
             ZONE LOGISTICS DATA:\n\
             {logistics_json}\n\
             \n\
             LOGISTICS CONSTRAINTS:\n\
             - Each vehicle can carry approximately {capacity:.0} kg of mixed supplies\n\
             - Average speed: {good:.0} km/h on good roads, {fair:.0} km/h on fair roads, {poor:.0} km/h on poor roads\n\
             - Loading time at depot: 1 hour\n\
             - Unloading time per zone: 30-45 minutes depending on accessibility\n\
             - Security concerns may require escorts (adds 15 minutes per zone)\n\
             - Maximum {max_hours:.0} hours driving per day per vehicle\n\
             - Priority zones should be visited first\n\
             \n\
             ROUTE PLANNING OBJECTIVES:\n\
             1. Minimize total delivery time\n\
             2. Prioritize highest-priority zones (visit first)\n\
             3. Group nearby zones on same route when possible\n\
             4. Account for road conditions and accessibility\n\
             5. Ensure security protocols for risk zones\n\
             \n\
             Return ONLY valid JSON in this exact format:\n\
             {{\n\
             \x20 \"routes\": [\n\
             \x20   {{\n\
             \x20     \"route_id\": 1,\n\
             \x20     \"vehicle_number\": 1,\n\
             \x20     \"zones_sequence\": [\"Z01\", \"Z03\"],\n\
             \x20     \"zone_names\": [\"Sector A\", \"Sector C\"],\n\
             \x20     \"total_distance_km\": 25.5,\n\
             \x20     \"estimated_time_hours\": 4.5,\n\
             \x20     \"road_conditions\": \"mostly good, some fair\",\n\
             \x20     \"special_requirements\": \"security escort for Z03\",\n\
             \x20     \"delivery_notes\": \"Priority route - serve highest need zones first\"\n\
             \x20   }}\n\
             \x20 ],\n\
             \x20 \"total_vehicles_needed\": 2,\n\
             \x20 \"total_delivery_time_hours\": 8.5,\n\
             \x20 \"estimated_completion\": \"Day 1\",\n\
             \x20 \"logistics_summary\": \"Brief overview of logistics plan\",\n\
             \x20 \"potential_challenges\": [\"challenge1\", \"challenge2\"]\n\
             }}\n\
             \n\
             Do not include any text before or after the JSON.",
            capacity = self.cfg.vehicle_capacity_kg,
            good = RoadCondition::Good.average_speed_kmh(),
            fair = RoadCondition::Fair.average_speed_kmh(),
            poor = RoadCondition::Poor.average_speed_kmh(),
            max_hours = defaults::MAX_DRIVING_HOURS,
        )
    }

    /// Plan routes for every allocated zone
    pub async fn plan_delivery_routes(
        &self,
        allocations: &[ZoneAllocation],
        zones: &[Zone],
    ) -> Result<DeliveryPlan, LlmError> {
        info!(zones = allocations.len(), "🚚 Planning delivery logistics");

        let allocated: HashSet<&str> = allocations.iter().map(|a| a.zone_id.as_str()).collect();
        let zone_logistics: Vec<ZoneLogistics> = zones
            .iter()
            .filter(|z| allocated.contains(z.zone_id.as_str()))
            .map(ZoneLogistics::from)
            .collect();

        let Some(reply) = self.llm.ask(&self.build_prompt(allocations, &zone_logistics)).await? else {
            return Ok(self.fallback_plan(allocations, zones));
        };

        let plan = parse_reply::<DeliveryPlan>(&reply)
            .and_then(|raw| self.validate_plan(raw, allocations, zones));

        match plan {
            Some(plan) => {
                info!(
                    routes = plan.routes.len(),
                    vehicles = plan.total_vehicles_needed,
                    completion = %plan.estimated_completion,
                    "✓ Created delivery routes"
                );
                Ok(plan)
            }
            None => {
                warn!(
                    reply = %preview(&reply, 160),
                    "⚠️  Unusable route plan, using fallback route planning..."
                );
                Ok(self.fallback_plan(allocations, zones))
            }
        }
    }

    /// Trim a model plan to the allocated zones.
    ///
    /// Returns `None` when no route survives.
    pub fn validate_plan(
        &self,
        mut plan: DeliveryPlan,
        allocations: &[ZoneAllocation],
        zones: &[Zone],
    ) -> Option<DeliveryPlan> {
        let allocated: Vec<&str> = allocations.iter().map(|a| a.zone_id.as_str()).collect();
        let mut routed: HashSet<String> = HashSet::new();

        let mut routes = Vec::with_capacity(plan.routes.len());
        for mut route in plan.routes {
            let before = route.zones_sequence.len();
            route.zones_sequence.retain(|id| allocated.contains(&id.as_str()) && routed.insert(id.clone()));
            if route.zones_sequence.len() < before {
                warn!(
                    route_id = route.route_id,
                    removed = before - route.zones_sequence.len(),
                    "Removed unknown or repeated zones from route"
                );
            }
            if !route.zones_sequence.is_empty() {
                routes.push(route);
            }
        }

        if routes.is_empty() {
            return None;
        }

        // Allocated zones the plan skipped get their own routes
        let missing: Vec<ZoneAllocation> = allocations
            .iter()
            .filter(|a| !routed.contains(&a.zone_id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            warn!(zones = missing.len(), "Routing allocated zones missing from the plan");
            routes.extend(self.fallback_routes(&missing, zones));
        }

        for (i, route) in routes.iter_mut().enumerate() {
            let id = u32::try_from(i + 1).unwrap_or(u32::MAX);
            route.route_id = id;
            if route.vehicle_number == 0 {
                route.vehicle_number = id;
            }
            route.zone_names = route
                .zones_sequence
                .iter()
                .map(|zid| zone_name(zones, zid))
                .collect();
            if route.total_distance_km <= 0.0 {
                route.total_distance_km = round_to(route_distance(&route.zones_sequence, zones), 1);
            }
            if route.estimated_time_hours <= 0.0 {
                route.estimated_time_hours = self.estimate_hours(route.total_distance_km);
            }
        }

        let route_count = u32::try_from(routes.len()).unwrap_or(u32::MAX);
        plan.total_vehicles_needed = plan.total_vehicles_needed.max(route_count);
        if plan.total_delivery_time_hours <= 0.0 {
            plan.total_delivery_time_hours =
                round_to(routes.iter().map(|r| r.estimated_time_hours).sum(), 1);
        }
        if plan.estimated_completion.trim().is_empty() {
            plan.estimated_completion = defaults::FALLBACK_ESTIMATED_COMPLETION.to_string();
        }
        plan.routes = routes;
        Some(plan)
    }

    fn estimate_hours(&self, distance_km: f64) -> f64 {
        round_to(
            distance_km / self.cfg.fallback_average_speed_kmh + self.cfg.fallback_handling_hours,
            1,
        )
    }

    fn fallback_routes(&self, allocations: &[ZoneAllocation], zones: &[Zone]) -> Vec<DeliveryRoute> {
        allocations
            .chunks(self.cfg.fallback_zones_per_route.max(1))
            .enumerate()
            .map(|(i, chunk)| {
                let id = u32::try_from(i + 1).unwrap_or(u32::MAX);
                let zones_sequence: Vec<String> = chunk.iter().map(|a| a.zone_id.clone()).collect();
                let distance = round_to(route_distance(&zones_sequence, zones), 1);

                let mut conditions: Vec<String> = Vec::new();
                let mut escorts: Vec<&str> = Vec::new();
                for zid in &zones_sequence {
                    if let Some(z) = zones.iter().find(|z| &z.zone_id == zid) {
                        let c = z.road_condition.to_string();
                        if !conditions.contains(&c) {
                            conditions.push(c);
                        }
                        if z.security_level != SecurityLevel::Safe {
                            escorts.push(zid);
                        }
                    }
                }

                DeliveryRoute {
                    route_id: id,
                    vehicle_number: id,
                    zone_names: zones_sequence.iter().map(|zid| zone_name(zones, zid)).collect(),
                    zones_sequence: zones_sequence.clone(),
                    total_distance_km: distance,
                    estimated_time_hours: self.estimate_hours(distance),
                    road_conditions: conditions.join(", "),
                    special_requirements: if escorts.is_empty() {
                        String::new()
                    } else {
                        format!("security escort for {}", escorts.join(", "))
                    },
                    delivery_notes: defaults::FALLBACK_ROUTE_NOTES.to_string(),
                }
            })
            .collect()
    }

    /// Chunk zones in priority order, a few per vehicle
    pub fn fallback_plan(&self, allocations: &[ZoneAllocation], zones: &[Zone]) -> DeliveryPlan {
        let routes = self.fallback_routes(allocations, zones);

        DeliveryPlan {
            total_vehicles_needed: u32::try_from(routes.len()).unwrap_or(u32::MAX),
            total_delivery_time_hours: round_to(
                routes.iter().map(|r| r.estimated_time_hours).sum(),
                1,
            ),
            estimated_completion: defaults::FALLBACK_ESTIMATED_COMPLETION.to_string(),
            logistics_summary: defaults::FALLBACK_LOGISTICS_SUMMARY.to_string(),
            potential_challenges: defaults::FALLBACK_POTENTIAL_CHALLENGES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            routes,
        }
    }

    /// Weight breakdown of the cargo for one route
    pub fn optimize_vehicle_loading(
        &self,
        route: &DeliveryRoute,
        allocations: &[ZoneAllocation],
    ) -> LoadingPlan {
        let mut total_weight = 0.0;
        let mut loading_sequence = Vec::new();

        for zid in &route.zones_sequence {
            let Some(alloc) = allocations.iter().find(|a| &a.zone_id == zid) else {
                continue;
            };

            let mut items = BTreeMap::new();
            let mut zone_weight = 0.0;
            for (kind, quantity) in alloc.supplies.iter().filter(|(_, q)| *q > 0) {
                let weight = quantity as f64 * kind.unit_weight_kg();
                zone_weight += weight;
                items.insert(
                    kind,
                    LoadedItem {
                        quantity,
                        weight_kg: round_to(weight, 1),
                    },
                );
            }
            total_weight += zone_weight;

            loading_sequence.push(ZoneLoad {
                zone_id: alloc.zone_id.clone(),
                zone_name: alloc.zone_name.clone(),
                items,
                total_weight_kg: round_to(zone_weight, 1),
            });
        }

        let capacity = self.cfg.vehicle_capacity_kg;
        LoadingPlan {
            route_id: route.route_id,
            loading_sequence,
            total_weight_kg: round_to(total_weight, 1),
            capacity_used_percent: round_to(total_weight / capacity * 100.0, 1),
            weight_status: if total_weight <= capacity {
                WeightStatus::Ok
            } else {
                WeightStatus::Overweight
            },
        }
    }

    /// Loading plans for every route in a plan
    pub fn loading_plans(&self, plan: &DeliveryPlan, allocations: &[ZoneAllocation]) -> Vec<LoadingPlan> {
        plan.routes
            .iter()
            .map(|r| {
                let lp = self.optimize_vehicle_loading(r, allocations);
                if lp.weight_status == WeightStatus::Overweight {
                    warn!(
                        route_id = lp.route_id,
                        weight_kg = lp.total_weight_kg,
                        capacity_pct = lp.capacity_used_percent,
                        "Route cargo exceeds vehicle capacity"
                    );
                }
                lp
            })
            .collect()
    }

    /// Back-to-back clock schedule for every route
    pub fn generate_delivery_schedule(&self, plan: &DeliveryPlan) -> Vec<RouteSchedule> {
        let unloading_hours = f64::from(self.cfg.unloading_minutes) / 60.0;
        let mut current = self.cfg.schedule_start_hour;

        plan.routes
            .iter()
            .map(|route| {
                let stops: Vec<ZoneStop> = route
                    .zones_sequence
                    .iter()
                    .enumerate()
                    .map(|(i, zid)| {
                        let arrival = current + i as f64 * self.cfg.zone_stop_hours;
                        ZoneStop {
                            sequence: u32::try_from(i + 1).unwrap_or(u32::MAX),
                            zone_id: zid.clone(),
                            arrival_time: format_clock(arrival),
                            unloading_duration_minutes: self.cfg.unloading_minutes,
                            departure_time: format_clock(arrival + unloading_hours),
                        }
                    })
                    .collect();

                let end = current + route.zones_sequence.len() as f64 * self.cfg.zone_stop_hours;
                let schedule = RouteSchedule {
                    route_id: route.route_id,
                    start_time: format_clock(current),
                    zones: stops,
                    end_time: format_clock(end),
                };
                current = end + self.cfg.route_buffer_hours;
                schedule
            })
            .collect()
    }
}

fn zone_name(zones: &[Zone], zone_id: &str) -> String {
    zones
        .iter()
        .find(|z| z.zone_id == zone_id)
        .map_or_else(|| "Unknown".to_string(), |z| z.zone_name.clone())
}

fn route_distance(sequence: &[String], zones: &[Zone]) -> f64 {
    sequence
        .iter()
        .map(|zid| {
            zones
                .iter()
                .find(|z| &z.zone_id == zid)
                .map_or(defaults::FALLBACK_UNKNOWN_DISTANCE_KM, |z| z.distance_from_depot)
        })
        .sum()
}

impl Agent for LogisticsCoordinatorAgent {
    fn name(&self) -> &'static str {
        "LogisticsCoordinator"
    }

    fn temperature(&self) -> f32 {
        self.llm.temperature()
    }

    fn is_online(&self) -> bool {
        self.llm.is_online()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SettlementSimulator;
    use crate::types::{ResourceKind, Supplies};

    fn agent() -> LogisticsCoordinatorAgent {
        LogisticsCoordinatorAgent::new(None, &ReliefConfig::default())
    }

    fn alloc(id: &str, supplies: Supplies) -> ZoneAllocation {
        ZoneAllocation {
            zone_id: id.to_string(),
            zone_name: format!("Sector {id}"),
            priority_score: 70.0,
            supplies,
            justification: String::new(),
        }
    }

    fn allocs_for(zones: &[Zone]) -> Vec<ZoneAllocation> {
        zones.iter().map(|z| alloc(&z.zone_id, Supplies::default())).collect()
    }

    #[test]
    fn clock_format_floors_minutes() {
        assert_eq!(format_clock(8.0), "08:00");
        assert_eq!(format_clock(8.5), "08:30");
        assert_eq!(format_clock(9.999), "09:59");
        assert_eq!(format_clock(25.25), "25:15");
    }

    #[test]
    fn fallback_chunks_by_three() {
        let sim = SettlementSimulator::new(7, 42);
        let allocs = allocs_for(sim.zones());
        let plan = agent().fallback_plan(&allocs, sim.zones());

        assert_eq!(plan.routes.len(), 3);
        assert_eq!(plan.routes[0].zones_sequence, vec!["Z01", "Z02", "Z03"]);
        assert_eq!(plan.routes[2].zones_sequence, vec!["Z07"]);
        assert_eq!(plan.total_vehicles_needed, 3);
        assert_eq!(plan.estimated_completion, "Day 1-2");
        assert_eq!(plan.potential_challenges, vec!["Weather dependent", "Road conditions"]);

        let z = sim.zones();
        let expected = round_to(z[0].distance_from_depot + z[1].distance_from_depot + z[2].distance_from_depot, 1);
        assert!((plan.routes[0].total_distance_km - expected).abs() < 1e-9);
        assert!((plan.routes[0].estimated_time_hours - round_to(expected / 30.0 + 2.0, 1)).abs() < 1e-9);
    }

    #[test]
    fn fallback_uses_ten_km_for_unknown_zone() {
        let plan = agent().fallback_plan(&[alloc("Z42", Supplies::default())], &[]);
        assert!((plan.routes[0].total_distance_km - 10.0).abs() < 1e-9);
        assert_eq!(plan.routes[0].zone_names, vec!["Unknown"]);
    }

    #[test]
    fn validation_strips_unknown_zones_and_renumbers() {
        let sim = SettlementSimulator::new(4, 42);
        let allocs = allocs_for(&sim.zones()[..3]);
        let route = |id: u32, seq: &[&str]| DeliveryRoute {
            route_id: id,
            vehicle_number: 0,
            zones_sequence: seq.iter().map(|s| (*s).to_string()).collect(),
            zone_names: vec![],
            total_distance_km: 0.0,
            estimated_time_hours: 0.0,
            road_conditions: String::new(),
            special_requirements: String::new(),
            delivery_notes: String::new(),
        };
        let raw = DeliveryPlan {
            routes: vec![route(7, &["Z99"]), route(9, &["Z02", "Z04", "Z01"])],
            total_vehicles_needed: 0,
            total_delivery_time_hours: 0.0,
            estimated_completion: String::new(),
            logistics_summary: "model plan".into(),
            potential_challenges: vec![],
        };

        let plan = agent().validate_plan(raw, &allocs, sim.zones()).unwrap();
        assert_eq!(plan.routes.len(), 2);
        assert_eq!(plan.routes[0].route_id, 1);
        assert_eq!(plan.routes[0].zones_sequence, vec!["Z02", "Z01"]);
        assert_eq!(plan.routes[0].zone_names, vec!["Sector B", "Sector A"]);
        // Z03 was allocated but not routed by the model
        assert_eq!(plan.routes[1].zones_sequence, vec!["Z03"]);
        assert_eq!(plan.routes[1].route_id, 2);
        assert!(plan.total_vehicles_needed >= 2);
        assert!(plan.total_delivery_time_hours > 0.0);
    }

    #[test]
    fn validation_rejects_plan_without_usable_routes() {
        let sim = SettlementSimulator::new(2, 42);
        let allocs = allocs_for(sim.zones());
        let raw = DeliveryPlan {
            routes: vec![],
            total_vehicles_needed: 1,
            total_delivery_time_hours: 1.0,
            estimated_completion: "Day 1".into(),
            logistics_summary: String::new(),
            potential_challenges: vec![],
        };
        assert!(agent().validate_plan(raw, &allocs, sim.zones()).is_none());
    }

    #[test]
    fn loading_plan_weighs_cargo() {
        let a = alloc(
            "Z01",
            Supplies {
                food_packages: 1000,
                shelter_materials: 100,
                ..Supplies::default()
            },
        );
        let b = alloc("Z02", Supplies { water_liters: 1000, ..Supplies::default() });
        let route = agent().fallback_plan(&[a.clone(), b.clone()], &[]).routes.remove(0);
        let lp = agent().optimize_vehicle_loading(&route, &[a, b]);

        // 500 + 1500 + 1000
        assert!((lp.total_weight_kg - 3000.0).abs() < 1e-9);
        assert!((lp.capacity_used_percent - 100.0).abs() < 1e-9);
        assert_eq!(lp.weight_status, WeightStatus::Ok);
        assert_eq!(lp.loading_sequence[0].items.len(), 2);
        assert!((lp.loading_sequence[0].items[&ResourceKind::ShelterMaterials].weight_kg - 1500.0).abs() < 1e-9);

        let heavy = alloc("Z03", Supplies { water_liters: 3001, ..Supplies::default() });
        let route = agent().fallback_plan(std::slice::from_ref(&heavy), &[]).routes.remove(0);
        assert_eq!(
            agent().optimize_vehicle_loading(&route, &[heavy]).weight_status,
            WeightStatus::Overweight
        );
    }

    #[test]
    fn schedule_runs_routes_back_to_back() {
        let sim = SettlementSimulator::new(5, 42);
        let allocs = allocs_for(sim.zones());
        let plan = agent().fallback_plan(&allocs, sim.zones());
        let schedule = agent().generate_delivery_schedule(&plan);

        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].start_time, "08:00");
        assert_eq!(schedule[0].zones[1].arrival_time, "09:00");
        assert_eq!(schedule[0].zones[1].departure_time, "09:30");
        assert_eq!(schedule[0].end_time, "11:00");
        // 11:00 + 0.5 h buffer
        assert_eq!(schedule[1].start_time, "11:30");
        assert_eq!(schedule[1].end_time, "13:30");
        assert_eq!(schedule[1].zones[0].sequence, 1);
    }
}
