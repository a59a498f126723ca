//! Monitor & Adaptation Agent - Phase 5
//!
//! Scores what actually reached each zone, asks the model for an
//! evaluation, and tracks success rates across cycles.

use std::sync::Arc;
use statrs::statistics::Statistics;
use tracing::{info, warn};

use super::{Agent, AgentLlm};
use crate::config::{defaults, ReliefConfig, ThresholdConfig};
use crate::llm::parsing::{parse_reply, preview};
use crate::llm::{LlmBackend, LlmError};
use crate::simulation::round_to;
use crate::types::{
    DeliveryChallenge, DeliveryOutcome, DeliveryPlan, LessonsLearned, OutcomeAnalysis,
    OutcomeBuckets, ReallocationRequest, Trend, TrendAnalysis, ZoneAllocation,
};

/// Arithmetic mean, `None` for an empty slice
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

/// Sort outcomes into delivery buckets and count non-trivial challenges
pub fn compute_buckets(outcomes: &[DeliveryOutcome], thresholds: &ThresholdConfig) -> OutcomeBuckets {
    let mut buckets = OutcomeBuckets::default();

    for o in outcomes {
        let pct = o.delivered_percentage;
        if pct >= thresholds.full_delivery_percent {
            buckets.fully_delivered.push(o.zone_id.clone());
        } else if pct >= thresholds.partial_delivery_percent {
            buckets.partially_delivered.push(o.zone_id.clone());
        } else {
            buckets.under_delivered.push(o.zone_id.clone());
        }

        if o.challenges != DeliveryChallenge::None {
            *buckets.challenges_encountered.entry(o.challenges).or_insert(0) += 1;
        }
    }

    buckets
}

/// Monitor and adaptation agent
#[derive(Debug, Clone)]
pub struct MonitorAdaptationAgent {
    llm: AgentLlm,
    thresholds: ThresholdConfig,
}

impl MonitorAdaptationAgent {
    pub fn new(backend: Option<Arc<dyn LlmBackend>>, config: &ReliefConfig) -> Self {
        Self {
            llm: AgentLlm::new(backend, config.llm.temperatures.monitor),
            thresholds: config.thresholds.clone(),
        }
    }

    pub fn build_prompt(
        &self,
        plan: &DeliveryPlan,
        outcomes: &[DeliveryOutcome],
        allocations: &[ZoneAllocation],
        buckets: &OutcomeBuckets,
    ) -> String {
        let outcomes_json = serde_json::to_string_pretty(outcomes).unwrap_or_default();
        let challenges_json =
            serde_json::to_string_pretty(&buckets.challenges_encountered).unwrap_or_default();
        let full = self.thresholds.full_delivery_percent;
        let partial = self.thresholds.partial_delivery_percent;
        let partial_top = full - 1.0;

        format!(
            "You are a humanitarian operations monitoring and evaluation specialist.\n\
             Analyze delivery outcomes and provide actionable recommendations for improvement.\n\
             \n\
             PLANNED DELIVERY:\n\
             - Routes planned: {routes}\n\
             - Zones targeted: {targeted}\n\
             - Total delivery time planned: {hours} hours\n\
             \n\
             ACTUAL OUTCOMES:\n\
             {outcomes_json}\n\
             \n\
             PERFORMANCE METRICS:\n\
             - Fully delivered (>={full}%): {n_full} zones\n\
             - Partially delivered ({partial}-{partial_top}%): {n_partial} zones\n\
             - Under-delivered (<{partial}%): {n_under} zones\n\
             \n\
             CHALLENGES ENCOUNTERED:\n\
             {challenges_json}\n\
             \n\
             ANALYSIS REQUIRED:\n\
             1. Calculate overall success rate and identify bottlenecks\n\
             2. Determine which zones need follow-up deliveries\n\
             3. Identify systemic issues (weather, roads, security, etc.)\n\
             4. Recommend process improvements for next cycle\n\
             5. Suggest priority adjustments based on actual outcomes\n\
             \n\
             Return ONLY valid JSON in this exact format:\n\
             {{\n\
             \x20 \"overall_success_rate\": 85.5,\n\
             \x20 \"zones_fully_served\": [\"Z01\", \"Z02\"],\n\
             \x20 \"zones_partially_served\": [\"Z03\"],\n\
             \x20 \"zones_requiring_followup\": [\"Z04\"],\n\
             \x20 \"critical_gaps\": [\n\
             \x20   {{\n\
             \x20     \"zone_id\": \"Z04\",\n\
             \x20     \"gap_description\": \"Only 60% delivered due to road conditions\",\n\
             \x20     \"urgency\": \"high\",\n\
             \x20     \"recommended_action\": \"Arrange alternative transport or wait for road repair\"\n\
             \x20   }}\n\
             \x20 ],\n\
             \x20 \"challenges_identified\": [\n\
             \x20   {{\n\
             \x20     \"challenge_type\": \"weather_delay\",\n\
             \x20     \"zones_affected\": 2,\n\
             \x20     \"impact\": \"Added 2 hours to delivery time\",\n\
             \x20     \"mitigation\": \"Start deliveries earlier in the day\"\n\
             \x20   }}\n\
             \x20 ],\n\
             \x20 \"performance_insights\": \"Brief analysis of what went well and what didn't\",\n\
             \x20 \"recommendations_next_cycle\": [\"recommendation 1\", \"recommendation 2\", \"recommendation 3\"],\n\
             \x20 \"priority_adjustments\": \"Suggested changes to zone priorities for next cycle\",\n\
             \x20 \"resource_reallocation_needed\": {{\n\
             \x20   \"zones\": [\"Z04\"],\n\
             \x20   \"resources_needed\": {{\"food_packages\": 500, \"water_liters\": 2000}},\n\
             \x20   \"reason\": \"Shortfall from partial delivery\"\n\
             \x20 }}\n\
             }}\n\
             \n\
             Do not include any text before or after the JSON.",
            routes = plan.routes.len(),
            targeted = allocations.len(),
            hours = plan.total_delivery_time_hours,
            n_full = buckets.fully_delivered.len(),
            n_partial = buckets.partially_delivered.len(),
            n_under = buckets.under_delivered.len(),
        )
    }

    /// Evaluate this cycle's deliveries
    pub async fn analyze_delivery_outcomes(
        &self,
        plan: &DeliveryPlan,
        outcomes: &[DeliveryOutcome],
        allocations: &[ZoneAllocation],
    ) -> Result<OutcomeAnalysis, LlmError> {
        info!(zones = outcomes.len(), "📊 Analyzing delivery outcomes");

        let buckets = compute_buckets(outcomes, &self.thresholds);
        let prompt = self.build_prompt(plan, outcomes, allocations, &buckets);

        let Some(reply) = self.llm.ask(&prompt).await? else {
            return Ok(self.fallback_analysis(outcomes));
        };

        let analysis = match parse_reply::<OutcomeAnalysis>(&reply) {
            Some(mut analysis) if analysis.overall_success_rate.is_finite() => {
                analysis.overall_success_rate = analysis.overall_success_rate.clamp(0.0, 100.0);
                analysis
            }
            _ => {
                warn!(
                    reply = %preview(&reply, 160),
                    "⚠️  Unparseable outcome analysis, using fallback analysis..."
                );
                return Ok(self.fallback_analysis(outcomes));
            }
        };

        info!(
            success_rate = %format!("{:.1}%", analysis.overall_success_rate),
            fully_served = analysis.zones_fully_served.len(),
            followup = analysis.zones_requiring_followup.len(),
            "✓ Analysis complete"
        );
        Ok(analysis)
    }

    /// Analysis built from the delivered percentages alone
    pub fn fallback_analysis(&self, outcomes: &[DeliveryOutcome]) -> OutcomeAnalysis {
        let buckets = compute_buckets(outcomes, &self.thresholds);
        let rates: Vec<f64> = outcomes.iter().map(|o| o.delivered_percentage).collect();
        let success_rate = mean(&rates).map_or(0.0, |m| round_to(m, 1));

        OutcomeAnalysis {
            overall_success_rate: success_rate,
            zones_fully_served: buckets.fully_delivered,
            zones_partially_served: buckets.partially_delivered,
            zones_requiring_followup: buckets.under_delivered.clone(),
            critical_gaps: Vec::new(),
            challenges_identified: Vec::new(),
            performance_insights: defaults::FALLBACK_PERFORMANCE_INSIGHTS.to_string(),
            recommendations_next_cycle: defaults::FALLBACK_RECOMMENDATIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            priority_adjustments: defaults::FALLBACK_PRIORITY_ADJUSTMENTS.to_string(),
            resource_reallocation_needed: ReallocationRequest {
                zones: buckets.under_delivered,
                reason: defaults::FALLBACK_REALLOCATION_REASON.to_string(),
                ..ReallocationRequest::default()
            },
        }
    }

    /// Compare this cycle with the ones before it
    pub fn track_historical_performance(
        &self,
        current: &OutcomeAnalysis,
        previous: &[OutcomeAnalysis],
    ) -> TrendAnalysis {
        let current_rate = current.overall_success_rate;
        let previous_rates: Vec<f64> = previous.iter().map(|a| a.overall_success_rate).collect();

        let Some(avg_previous) = mean(&previous_rates) else {
            return TrendAnalysis {
                trend: Trend::FirstCycle,
                current_success_rate: current_rate,
                average_previous_rate: None,
                improvement_percentage: 0.0,
                total_cycles_completed: 1,
                best_cycle_position: 1,
                best_success_rate: current_rate,
                message: "No historical data available yet".to_string(),
            };
        };

        let improvement = current_rate - avg_previous;
        let band = self.thresholds.trend_band_percent;
        let trend = if improvement > band {
            Trend::Improving
        } else if improvement < -band {
            Trend::Declining
        } else {
            Trend::Stable
        };

        // First maximum wins, current cycle last
        let (best_index, best_rate) = previous_rates
            .iter()
            .copied()
            .chain(std::iter::once(current_rate))
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, rate)| {
                if rate > best.1 {
                    (i, rate)
                } else {
                    best
                }
            });

        TrendAnalysis {
            trend,
            current_success_rate: current_rate,
            average_previous_rate: Some(round_to(avg_previous, 1)),
            improvement_percentage: round_to(improvement, 1),
            total_cycles_completed: previous.len() + 1,
            best_cycle_position: best_index + 1,
            best_success_rate: best_rate,
            message: format!(
                "Performance {trend}: {improvement:+.1} points against the previous average of {avg_previous:.1}%"
            ),
        }
    }

    pub fn generate_lessons_learned(&self, analysis: &OutcomeAnalysis) -> LessonsLearned {
        let mut lessons = LessonsLearned::default();

        if analysis.overall_success_rate >= defaults::LESSONS_SUCCESS_RATE {
            lessons
                .successes
                .push(format!("Achieved {:.1}% success rate", analysis.overall_success_rate));
        }
        if !analysis.zones_fully_served.is_empty() {
            lessons.successes.push(format!(
                "Successfully served {} zones completely",
                analysis.zones_fully_served.len()
            ));
        }

        lessons.challenges = analysis
            .challenges_identified
            .iter()
            .map(|c| format!("{}: {}", c.challenge_type, c.impact))
            .collect();

        lessons.best_practices = analysis
            .recommendations_next_cycle
            .iter()
            .take(defaults::LESSONS_BEST_PRACTICES)
            .cloned()
            .collect();

        if !analysis.zones_requiring_followup.is_empty() {
            lessons.areas_for_improvement.push(format!(
                "Follow-up needed for {} zones",
                analysis.zones_requiring_followup.len()
            ));
        }

        lessons
    }
}

impl Agent for MonitorAdaptationAgent {
    fn name(&self) -> &'static str {
        "MonitorAdaptation"
    }

    fn temperature(&self) -> f32 {
        self.llm.temperature()
    }

    fn is_online(&self) -> bool {
        self.llm.is_online()
    }
}
