//! Aid Orchestrator - runs the distribution cycle
//!
//! ## Phases
//!
//! 1. **Settlement data**: current zone table and depot stock for the scenario
//! 2. **Needs assessment**: priority score per zone, sorted descending
//! 3. **Resource allocation**: supplies for the top `max_zones` zones
//! 4. **Logistics**: routes, clock schedule, per-route loading plans
//! 5. **Delivery & monitoring**: simulated execution, outcome analysis
//! 6. **Compilation**: `CycleResults`, cycle history, optional feedback of
//!    delivered supplies into the settlement for the next cycle
//!
//! The orchestrator owns every agent and the simulator, so cycles run
//! strictly one after another.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::monitor::mean;
use super::{
    LogisticsCoordinatorAgent, MonitorAdaptationAgent, NeedsAssessmentAgent,
    ResourceAllocationAgent,
};
use crate::config::{defaults, ReliefConfig};
use crate::llm::LlmBackend;
use crate::simulation::{round_to, simulate_execution, SettlementSimulator};
use crate::storage;
use crate::types::{
    BestCycle, CycleResults, DeliveryOutcome, DeliveryOutcomesSection, DeliveryStatus,
    LogisticsSection, NeedsAssessmentSection, OutcomeAnalysis, PerformanceMetrics,
    ResourceAllocationSection, SettlementData, SummaryReport, Trend,
};

const PHASE_RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

fn phase_banner(title: &str) {
    info!("{}", PHASE_RULE);
    info!("{}", title);
    info!("{}", PHASE_RULE);
}

/// Seed offset separating the delivery stream from settlement generation
const DELIVERY_SEED_OFFSET: u64 = 0x9E37_79B9_7F4A_7C15;

/// Coordinates the four agents across distribution cycles
pub struct AidOrchestrator {
    config: ReliefConfig,
    simulator: SettlementSimulator,
    needs_agent: NeedsAssessmentAgent,
    allocation_agent: ResourceAllocationAgent,
    logistics_agent: LogisticsCoordinatorAgent,
    monitor_agent: MonitorAdaptationAgent,
    delivery_rng: StdRng,
    history: Vec<CycleResults>,
}

impl AidOrchestrator {
    /// Build the simulator and agents. `None` runs every agent offline.
    pub fn new(config: ReliefConfig, backend: Option<Arc<dyn LlmBackend>>) -> Self {
        let sim_cfg = &config.simulation;
        info!(
            zones = sim_cfg.num_zones,
            scenario = %sim_cfg.scenario,
            seed = sim_cfg.seed,
            online = backend.is_some(),
            "🤖 Initializing aid orchestrator"
        );

        let simulator = SettlementSimulator::new(sim_cfg.num_zones, sim_cfg.seed);
        let delivery_rng = StdRng::seed_from_u64(sim_cfg.seed ^ DELIVERY_SEED_OFFSET);

        let orchestrator = Self {
            needs_agent: NeedsAssessmentAgent::new(backend.clone(), &config),
            allocation_agent: ResourceAllocationAgent::new(backend.clone(), &config),
            logistics_agent: LogisticsCoordinatorAgent::new(backend.clone(), &config),
            monitor_agent: MonitorAdaptationAgent::new(backend, &config),
            simulator,
            delivery_rng,
            history: Vec::new(),
            config,
        };
        info!("✓ Needs Assessment, Resource Allocation, Logistics and Monitor agents ready");
        orchestrator
    }

    pub fn config(&self) -> &ReliefConfig {
        &self.config
    }

    pub fn simulator(&self) -> &SettlementSimulator {
        &self.simulator
    }

    /// Completed cycles, oldest first
    pub fn history(&self) -> &[CycleResults] {
        &self.history
    }

    /// Run phases 1-6 once and append the results to the history
    pub async fn run_distribution_cycle(
        &mut self,
        cycle_number: u32,
        max_zones: usize,
    ) -> Result<CycleResults> {
        let started = Instant::now();
        let timestamp = Utc::now();
        let scenario = self.config.simulation.scenario;

        info!("══════════════════════════════════════════════════════════════════════");
        info!("DISTRIBUTION CYCLE #{}", cycle_number);
        info!("══════════════════════════════════════════════════════════════════════");

        // Phase 1
        phase_banner("PHASE 1: SETTLEMENT DATA COLLECTION");
        let zones = self.simulator.zones().to_vec();
        let available = self.simulator.available_resources(scenario);
        let total_population: u64 = zones.iter().map(|z| u64::from(z.population)).sum();
        info!(zones = zones.len(), population = total_population, "✓ Loaded settlement zones");
        for (kind, amount) in available.supplies.iter() {
            info!("   • {}: {}", kind, amount);
        }
        info!(
            vehicles = available.vehicles_available,
            personnel = available.personnel_available,
            budget_usd = available.budget_usd,
            "   Fleet and budget"
        );

        // Phase 2
        phase_banner("PHASE 2: NEEDS ASSESSMENT");
        let prioritized = self
            .needs_agent
            .assess_all_zones(&zones)
            .await
            .context("needs assessment failed")?;
        let report = self.needs_agent.generate_needs_report(&prioritized);
        info!(
            critical = report.critical_zones,
            high = report.high_priority_zones,
            average = %format!("{:.1}", report.average_priority_score),
            "Assessment summary"
        );
        for (i, z) in prioritized.iter().take(defaults::TOP_ZONES_IN_REPORT).enumerate() {
            info!(
                "   {}. {} ({}): {:.1}  needs: {}",
                i + 1,
                z.zone_name,
                z.zone_id,
                z.priority_score,
                z.critical_needs.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
            );
        }

        // Phase 3
        phase_banner("PHASE 3: RESOURCE ALLOCATION OPTIMIZATION");
        let allocations = self
            .allocation_agent
            .allocate_resources(&prioritized, &available, max_zones)
            .await
            .context("resource allocation failed")?;
        let coverage = ResourceAllocationAgent::calculate_coverage(&allocations, &zones);
        info!(
            served = coverage.zones_served,
            total = coverage.total_zones,
            population = coverage.population_served,
            coverage = %format!("{:.1}%", coverage.coverage_percentage),
            "Allocation coverage"
        );

        // Phase 4
        phase_banner("PHASE 4: LOGISTICS & ROUTE PLANNING");
        let delivery_plan = self
            .logistics_agent
            .plan_delivery_routes(&allocations, &zones)
            .await
            .context("route planning failed")?;
        for route in &delivery_plan.routes {
            info!(
                "   Route {}: {} ({:.1} km, {:.1} h)",
                route.route_id,
                route.zone_names.join(" → "),
                route.total_distance_km,
                route.estimated_time_hours
            );
        }
        let schedule = self.logistics_agent.generate_delivery_schedule(&delivery_plan);
        let loading_plans = self.logistics_agent.loading_plans(&delivery_plan, &allocations);
        info!(
            routes = delivery_plan.routes.len(),
            vehicles = delivery_plan.total_vehicles_needed,
            hours = delivery_plan.total_delivery_time_hours,
            completion = %delivery_plan.estimated_completion,
            "Delivery plan ready"
        );

        // Phase 5
        phase_banner("PHASE 5: DELIVERY EXECUTION & MONITORING");
        let outcomes = simulate_execution(&allocations, &self.config.thresholds, &mut self.delivery_rng);
        let analysis = self
            .monitor_agent
            .analyze_delivery_outcomes(&delivery_plan, &outcomes, &allocations)
            .await
            .context("outcome analysis failed")?;
        info!(
            success_rate = %format!("{:.1}%", analysis.overall_success_rate),
            fully_served = analysis.zones_fully_served.len(),
            partially_served = analysis.zones_partially_served.len(),
            followup = analysis.zones_requiring_followup.len(),
            "Delivery results"
        );
        for c in analysis.challenges_identified.iter().take(3) {
            info!("   ⚠ {}: {}", c.challenge_type, c.impact);
        }
        for (i, rec) in analysis.recommendations_next_cycle.iter().take(3).enumerate() {
            info!("   {}. {}", i + 1, rec);
        }
        let lessons_learned = self.monitor_agent.generate_lessons_learned(&analysis);

        // Phase 6
        let previous: Vec<OutcomeAnalysis> = self
            .history
            .iter()
            .map(|c| c.delivery_outcomes.analysis.clone())
            .collect();
        let trend = self.monitor_agent.track_historical_performance(&analysis, &previous);

        if self.config.simulation.apply_deliveries {
            self.apply_deliveries(&outcomes);
        }

        let performance_metrics = PerformanceMetrics {
            zones_served: allocations.len(),
            success_rate: analysis.overall_success_rate,
            population_served: coverage.population_served,
            coverage_percentage: coverage.coverage_percentage,
        };

        let results = CycleResults {
            cycle_number,
            timestamp,
            duration_seconds: started.elapsed().as_secs_f64(),
            resource_scenario: scenario,
            settlement_data: SettlementData {
                total_zones: zones.len(),
                total_population,
                zones_data: zones,
            },
            available_resources: available,
            needs_assessment: NeedsAssessmentSection {
                prioritized_zones: prioritized,
                report,
            },
            resource_allocation: ResourceAllocationSection { allocations, coverage },
            logistics_plan: LogisticsSection {
                delivery_plan,
                schedule,
                loading_plans,
            },
            delivery_outcomes: DeliveryOutcomesSection {
                actual_results: outcomes,
                analysis,
                lessons_learned,
            },
            performance_metrics,
            trend: Some(trend),
        };

        info!("══════════════════════════════════════════════════════════════════════");
        info!(
            duration_secs = %format!("{:.1}", results.duration_seconds),
            success_rate = %format!("{:.1}%", results.performance_metrics.success_rate),
            population_served = results.performance_metrics.population_served,
            "✅ CYCLE #{} COMPLETE",
            cycle_number
        );

        self.history.push(results.clone());
        Ok(results)
    }

    /// Feed complete and partial deliveries back into the settlement
    fn apply_deliveries(&mut self, outcomes: &[DeliveryOutcome]) {
        let mut updated = 0usize;
        for o in outcomes {
            if o.delivery_status == DeliveryStatus::Incomplete {
                continue;
            }
            if self.simulator.update_zone_after_delivery(&o.zone_id, &o.planned_delivery) {
                updated += 1;
            } else {
                warn!(zone_id = %o.zone_id, "Delivered zone not found in settlement");
            }
        }
        info!(zones = updated, "Settlement updated with delivered supplies");
    }

    /// Write one cycle's results as pretty JSON under `dir`
    pub fn save_results(&self, results: &CycleResults, dir: &Path) -> Result<PathBuf> {
        storage::save_results(results, dir)
            .with_context(|| format!("saving cycle {} results", results.cycle_number))
    }

    /// Run `num_cycles` cycles back to back, saving each under the output
    /// directory. Returns the saved file paths.
    pub async fn run_multiple_cycles(
        &mut self,
        num_cycles: u32,
        max_zones: usize,
        cancel: CancellationToken,
    ) -> Result<Vec<PathBuf>> {
        info!(cycles = num_cycles, max_zones, "🔁 Running distribution cycles");
        let output_dir = self.config.output.dir.clone();
        let mut saved = Vec::with_capacity(num_cycles as usize);

        for cycle in 1..=num_cycles {
            if cancel.is_cancelled() {
                bail!("interrupted before cycle {cycle} of {num_cycles}");
            }

            let results = tokio::select! {
                biased;
                _ = cancel.cancelled() => bail!("interrupted during cycle {cycle} of {num_cycles}"),
                r = self.run_distribution_cycle(cycle, max_zones) => r?,
            };
            saved.push(self.save_results(&results, &output_dir)?);

            if cycle > 1 {
                if let Some(trend) = &results.trend {
                    let arrow = match trend.trend {
                        Trend::Improving => "📈",
                        Trend::Declining => "📉",
                        Trend::Stable | Trend::FirstCycle => "➡️",
                    };
                    info!(
                        improvement = %format!("{:+.1}%", trend.improvement_percentage),
                        "{} Performance trend: {}",
                        arrow,
                        trend.trend.to_string().to_uppercase()
                    );
                }
            }
            if cycle < num_cycles {
                info!("⏸️  Preparing for next cycle...");
            }
        }

        Ok(saved)
    }

    /// Aggregate over the cycle history, `None` before the first cycle
    pub fn generate_summary_report(&self) -> Option<SummaryReport> {
        let rates: Vec<f64> = self
            .history
            .iter()
            .map(|c| c.performance_metrics.success_rate)
            .collect();
        let average = mean(&rates)?;

        let best = self.history.iter().fold(None::<&CycleResults>, |best, c| match best {
            Some(b) if b.performance_metrics.success_rate >= c.performance_metrics.success_rate => {
                Some(b)
            }
            _ => Some(c),
        })?;

        let total_cycles = self.history.len();
        Some(SummaryReport {
            total_cycles_completed: total_cycles,
            average_success_rate: round_to(average, 1),
            total_population_served: self
                .history
                .iter()
                .map(|c| c.performance_metrics.population_served)
                .sum(),
            best_cycle: BestCycle {
                cycle_number: best.cycle_number,
                success_rate: best.performance_metrics.success_rate,
            },
            summary: format!(
                "Completed {total_cycles} cycles with {average:.1}% average success rate"
            ),
        })
    }
}
