//! Resource Allocation Agent - Phase 3
//!
//! Splits depot stock across the highest-priority zones. Whatever the model
//! proposes is checked against the target zone set and the available stock
//! before it is accepted.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use super::{Agent, AgentLlm};
use crate::config::{defaults, ReliefConfig};
use crate::llm::parsing::{parse_reply, preview};
use crate::llm::{LlmBackend, LlmError};
use crate::types::{
    AvailableResources, Coverage, KindUtilisation, ResourceKind, Zone, ZoneAllocation,
    ZoneAssessment,
};

/// Resource allocation agent
#[derive(Debug, Clone)]
pub struct ResourceAllocationAgent {
    llm: AgentLlm,
    reserve_fraction: f64,
}

impl ResourceAllocationAgent {
    pub fn new(backend: Option<Arc<dyn LlmBackend>>, config: &ReliefConfig) -> Self {
        Self {
            llm: AgentLlm::new(backend, config.llm.temperatures.resource_allocation),
            reserve_fraction: config.allocation.emergency_reserve_fraction,
        }
    }

    pub fn build_prompt(&self, targets: &[ZoneAssessment], available: &AvailableResources) -> String {
        let zones_json = serde_json::to_string_pretty(targets).unwrap_or_default();
        let stock_json = serde_json::to_string_pretty(available).unwrap_or_default();
        let reserve_pct = self.reserve_fraction * 100.0;
        let usable_pct = 100.0 - reserve_pct;

        format!(
            "You are a resource allocation optimizer for humanitarian aid distribution.\n\
             Your goal is to save the most lives and reduce suffering by optimally distributing limited resources.\n\
             \n\
             TOP PRIORITY ZONES (in order of urgency):\n\
             {zones_json}\n\
             \n\
             AVAILABLE RESOURCES:\n\
             {stock_json}\n\
             \n\
             ALLOCATION RULES:\n\
             1. Highest priority zones MUST receive resources first\n\
             2. Critical needs (food, water, medical) take precedence\n\
             3. Ensure you don't exceed available resources\n\
             4. Each zone should get resources proportional to population and need severity\n\
             5. Reserve {reserve_pct:.0}% of resources for emergencies\n\
             6. Consider vulnerable populations (children, elderly, pregnant women)\n\
             \n\
             RESOURCE GUIDELINES:\n\
             - Food packages: ~2 per person per week\n\
             - Water liters: ~15 per person per day\n\
             - Medical kits: 1 per 50 people with medical needs\n\
             - Shelter materials: Based on damage level\n\
             - Hygiene kits: 1 per 10 people\n\
             \n\
             Return ONLY valid JSON array of allocations:\n\
             [\n\
             \x20 {{\n\
             \x20   \"zone_id\": \"Z01\",\n\
             \x20   \"zone_name\": \"Sector A\",\n\
             \x20   \"priority_score\": 85.5,\n\
             \x20   \"food_packages\": 1200,\n\
             \x20   \"water_liters\": 8000,\n\
             \x20   \"medical_kits\": 45,\n\
             \x20   \"shelter_materials\": 20,\n\
             \x20   \"blankets\": 300,\n\
             \x20   \"hygiene_kits\": 150,\n\
             \x20   \"justification\": \"Brief reason for this allocation\"\n\
             \x20 }}\n\
             ]\n\
             \n\
             Ensure allocations don't exceed {usable_pct:.0}% of available resources (reserve {reserve_pct:.0}% for emergencies).\n\
             Do not include any text before or after the JSON array."
        )
    }

    /// Allocate stock across the first `max_zones` prioritized zones
    pub async fn allocate_resources(
        &self,
        prioritized: &[ZoneAssessment],
        available: &AvailableResources,
        max_zones: usize,
    ) -> Result<Vec<ZoneAllocation>, LlmError> {
        let targets = &prioritized[..max_zones.min(prioritized.len())];
        info!(zones = targets.len(), "📦 Allocating resources to top priority zones");

        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let Some(reply) = self.llm.ask(&self.build_prompt(targets, available)).await? else {
            return Ok(self.fallback_allocation(targets, available));
        };

        let allocations = match parse_reply::<Vec<ZoneAllocation>>(&reply) {
            Some(raw) => self.validate_allocations(raw, targets, available),
            None => {
                warn!(
                    reply = %preview(&reply, 160),
                    "Could not parse allocation reply"
                );
                Vec::new()
            }
        };

        if allocations.is_empty() {
            warn!("⚠️  Using fallback allocation strategy...");
            return Ok(self.fallback_allocation(targets, available));
        }

        info!(zones = allocations.len(), "✓ Allocated resources");
        self.log_allocation_summary(&allocations, available);
        Ok(allocations)
    }

    /// Make a model-proposed allocation safe to execute.
    ///
    /// - drops zones outside `targets` and repeated zones
    /// - fills missing names and priorities from the assessment
    /// - scales down, proportionally and floored, any kind whose total
    ///   exceeds stock
    ///
    /// The result is ordered by priority rank.
    pub fn validate_allocations(
        &self,
        raw: Vec<ZoneAllocation>,
        targets: &[ZoneAssessment],
        available: &AvailableResources,
    ) -> Vec<ZoneAllocation> {
        let mut seen = HashSet::new();
        let mut accepted: Vec<(usize, ZoneAllocation)> = Vec::new();

        for mut alloc in raw {
            let Some(rank) = targets.iter().position(|t| t.zone_id == alloc.zone_id) else {
                warn!(zone_id = %alloc.zone_id, "Dropping allocation for zone outside the target set");
                continue;
            };
            if !seen.insert(alloc.zone_id.clone()) {
                warn!(zone_id = %alloc.zone_id, "Dropping duplicate allocation");
                continue;
            }

            let target = &targets[rank];
            if alloc.zone_name.trim().is_empty() {
                alloc.zone_name = target.zone_name.clone();
            }
            if alloc.priority_score <= 0.0 {
                alloc.priority_score = target.priority_score;
            }
            accepted.push((rank, alloc));
        }

        accepted.sort_by_key(|(rank, _)| *rank);
        let mut allocations: Vec<ZoneAllocation> = accepted.into_iter().map(|(_, a)| a).collect();

        let mut overallocated = Vec::new();
        for kind in ResourceKind::ALL {
            let stock = available.supplies.get(kind);
            let total = allocations
                .iter()
                .fold(0u64, |acc, a| acc.saturating_add(a.supplies.get(kind)));

            if total > stock {
                overallocated.push(format!("{kind}: {total} > {stock}"));
                let scale = stock as f64 / total as f64;
                for alloc in &mut allocations {
                    let scaled = (alloc.supplies.get(kind) as f64 * scale).floor() as u64;
                    alloc.supplies.set(kind, scaled);
                }
            } else {
                let usable = stock as f64 * (1.0 - self.reserve_fraction);
                if total as f64 > usable {
                    warn!(
                        kind = %kind,
                        allocated = total,
                        usable = usable.floor(),
                        "Allocation dips into the emergency reserve"
                    );
                }
            }
        }

        if !overallocated.is_empty() {
            warn!(
                "⚠️  Overallocation detected, scaled down: {}",
                overallocated.join(", ")
            );
        }

        allocations
    }

    /// Rank-weighted split of every kind, keeping the emergency reserve.
    ///
    /// Rank `i` of `n` receives `(n - i) / (n(n+1)/2)` of the usable stock.
    pub fn fallback_allocation(
        &self,
        targets: &[ZoneAssessment],
        available: &AvailableResources,
    ) -> Vec<ZoneAllocation> {
        let n = targets.len();
        let rank_sum = (n * (n + 1) / 2) as f64;
        let usable = 1.0 - self.reserve_fraction;

        targets
            .iter()
            .enumerate()
            .map(|(i, zone)| {
                let share = (n - i) as f64 / rank_sum * usable;
                let mut alloc = ZoneAllocation {
                    zone_id: zone.zone_id.clone(),
                    zone_name: zone.zone_name.clone(),
                    priority_score: zone.priority_score,
                    supplies: Default::default(),
                    justification: format!(
                        "{} {}",
                        defaults::FALLBACK_ALLOCATION_JUSTIFICATION,
                        i + 1
                    ),
                };
                for (kind, stock) in available.supplies.iter() {
                    alloc.supplies.set(kind, (stock as f64 * share).floor() as u64);
                }
                alloc
            })
            .collect()
    }

    /// Allocated versus available, per kind
    pub fn allocation_summary(
        allocations: &[ZoneAllocation],
        available: &AvailableResources,
    ) -> Vec<KindUtilisation> {
        ResourceKind::ALL
            .iter()
            .map(|&kind| {
                let allocated = allocations
                    .iter()
                    .fold(0u64, |acc, a| acc.saturating_add(a.supplies.get(kind)));
                let stock = available.supplies.get(kind);
                let percentage = if stock > 0 {
                    allocated as f64 / stock as f64 * 100.0
                } else {
                    0.0
                };
                KindUtilisation {
                    kind,
                    allocated,
                    available: stock,
                    percentage,
                }
            })
            .collect()
    }

    fn log_allocation_summary(&self, allocations: &[ZoneAllocation], available: &AvailableResources) {
        info!("   Resource Allocation Summary:");
        for u in Self::allocation_summary(allocations, available) {
            info!(
                "   • {}: {} / {} ({:.1}%)",
                u.kind, u.allocated, u.available, u.percentage
            );
        }
    }

    /// Zones and people reached by an allocation
    pub fn calculate_coverage(allocations: &[ZoneAllocation], zones: &[Zone]) -> Coverage {
        let total_population: u64 = zones.iter().map(|z| u64::from(z.population)).sum();
        let population_served: u64 = allocations
            .iter()
            .filter_map(|a| zones.iter().find(|z| z.zone_id == a.zone_id))
            .map(|z| u64::from(z.population))
            .sum();
        let coverage_percentage = if total_population == 0 {
            0.0
        } else {
            population_served as f64 / total_population as f64 * 100.0
        };

        Coverage {
            zones_served: allocations.len(),
            total_zones: zones.len(),
            population_served,
            total_population,
            coverage_percentage,
        }
    }
}

impl Agent for ResourceAllocationAgent {
    fn name(&self) -> &'static str {
        "ResourceAllocation"
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
    use crate::types::Supplies;

    fn target(id: &str, score: f64) -> ZoneAssessment {
        ZoneAssessment {
            zone_id: id.to_string(),
            zone_name: format!("Sector {id}"),
            priority_score: score,
            critical_needs: vec![],
            vulnerability_score: 0.0,
            shortage_score: 0.0,
            time_score: 0.0,
            reasoning: String::new(),
        }
    }

    fn stock(food: u64, water: u64) -> AvailableResources {
        AvailableResources {
            supplies: Supplies {
                food_packages: food,
                water_liters: water,
                medical_kits: 100,
                shelter_materials: 50,
                blankets: 300,
                hygiene_kits: 120,
            },
            vehicles_available: 6,
            personnel_available: 30,
            budget_usd: 100_000,
        }
    }

    fn agent() -> ResourceAllocationAgent {
        ResourceAllocationAgent::new(None, &ReliefConfig::default())
    }

    #[test]
    fn fallback_weights_by_rank_and_keeps_reserve() {
        let targets = vec![target("Z01", 90.0), target("Z02", 80.0), target("Z03", 70.0)];
        let available = stock(6000, 12000);
        let allocs = agent().fallback_allocation(&targets, &available);

        assert_eq!(allocs.len(), 3);
        // shares 3/6, 2/6, 1/6 of 90%
        assert_eq!(allocs[0].supplies.food_packages, 2700);
        assert!((1799..=1800).contains(&allocs[1].supplies.food_packages));
        assert!((899..=900).contains(&allocs[2].supplies.food_packages));
        assert_eq!(allocs[0].justification, "Proportional allocation based on priority rank 1");

        for kind in ResourceKind::ALL {
            let total: u64 = allocs.iter().map(|a| a.supplies.get(kind)).sum();
            assert!(total as f64 <= available.supplies.get(kind) as f64 * 0.9 + 1e-9);
        }
    }

    #[test]
    fn validation_drops_strangers_and_duplicates() {
        let targets = vec![target("Z01", 90.0), target("Z02", 80.0)];
        let mk = |id: &str, food: u64| ZoneAllocation {
            zone_id: id.to_string(),
            zone_name: String::new(),
            priority_score: 0.0,
            supplies: Supplies { food_packages: food, ..Supplies::default() },
            justification: String::new(),
        };
        let raw = vec![mk("Z02", 100), mk("Z09", 100), mk("Z01", 200), mk("Z02", 999)];
        let out = agent().validate_allocations(raw, &targets, &stock(6000, 12000));

        let ids: Vec<&str> = out.iter().map(|a| a.zone_id.as_str()).collect();
        assert_eq!(ids, vec!["Z01", "Z02"]);
        assert_eq!(out[0].zone_name, "Sector Z01");
        assert!((out[1].priority_score - 80.0).abs() < f64::EPSILON);
        assert_eq!(out[1].supplies.food_packages, 100);
    }

    #[test]
    fn validation_scales_overallocated_kinds() {
        let targets = vec![target("Z01", 90.0), target("Z02", 80.0)];
        let mk = |id: &str, food: u64, water: u64| ZoneAllocation {
            zone_id: id.to_string(),
            zone_name: id.to_string(),
            priority_score: 50.0,
            supplies: Supplies {
                food_packages: food,
                water_liters: water,
                ..Supplies::default()
            },
            justification: "x".into(),
        };
        let available = stock(1000, 12000);
        let out = agent().validate_allocations(
            vec![mk("Z01", 1500, 100), mk("Z02", 500, 200)],
            &targets,
            &available,
        );
        let food: u64 = out.iter().map(|a| a.supplies.food_packages).sum();
        assert!(food <= 1000);
        assert_eq!(out[0].supplies.food_packages, 750);
        assert_eq!(out[1].supplies.food_packages, 250);
        // untouched kind
        assert_eq!(out[1].supplies.water_liters, 200);
    }

    #[tokio::test]
    async fn offline_allocation_uses_fallback_for_top_zones() {
        let targets = vec![target("Z01", 90.0), target("Z02", 80.0), target("Z03", 70.0)];
        let out = agent()
            .allocate_resources(&targets, &stock(6000, 12000), 2)
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].zone_id, "Z01");
        assert!(agent().allocate_resources(&[], &stock(1, 1), 5).await.unwrap().is_empty());
    }

    #[test]
    fn coverage_counts_served_population() {
        let sim = SettlementSimulator::new(4, 42);
        let zones = sim.zones();
        let allocs: Vec<ZoneAllocation> = zones[..2]
            .iter()
            .map(|z| ZoneAllocation {
                zone_id: z.zone_id.clone(),
                zone_name: z.zone_name.clone(),
                priority_score: 1.0,
                supplies: Supplies::default(),
                justification: String::new(),
            })
            .collect();
        let cov = ResourceAllocationAgent::calculate_coverage(&allocs, zones);
        let served = u64::from(zones[0].population + zones[1].population);
        assert_eq!(cov.zones_served, 2);
        assert_eq!(cov.total_zones, 4);
        assert_eq!(cov.population_served, served);
        assert!(cov.coverage_percentage > 0.0 && cov.coverage_percentage < 100.0);

        let empty = ResourceAllocationAgent::calculate_coverage(&[], &[]);
        assert!(empty.coverage_percentage.abs() < f64::EPSILON);
    }

    #[test]
    fn summary_reports_each_kind() {
        let available = stock(1000, 0);
        let alloc = ZoneAllocation {
            zone_id: "Z01".into(),
            zone_name: "Sector A".into(),
            priority_score: 1.0,
            supplies: Supplies { food_packages: 250, ..Supplies::default() },
            justification: String::new(),
        };
        let summary = ResourceAllocationAgent::allocation_summary(&[alloc], &available);
        assert_eq!(summary.len(), 6);
        assert!((summary[0].percentage - 25.0).abs() < 1e-9);
        // zero stock reads as 0%
        assert!(summary[1].percentage.abs() < f64::EPSILON);
    }
}
