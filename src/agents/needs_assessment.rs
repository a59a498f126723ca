//! Needs Assessment Agent - Phase 2
//!
//! Scores every zone 0-100 for urgency against a fixed rubric:
//!
//! | Component                                   | Points |
//! |---------------------------------------------|--------|
//! | Vulnerable populations                      | 25     |
//! | Critical shortages (food, water, medical)   | 35     |
//! | Time since last aid                         | 20     |
//! | Population size                             | 10     |
//! | Shelter and sanitation conditions           | 10     |
//!
//! The LLM applies the rubric with judgment; offline, `rubric_score` applies
//! it arithmetically.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{Agent, AgentLlm};
use crate::config::{defaults, ReliefConfig};
use crate::llm::parsing::{parse_reply, preview};
use crate::llm::{LlmBackend, LlmError};
use crate::simulation::round_to;
use crate::types::rubric;
use crate::types::{NeedCount, NeedsReport, PriorityZoneRef, Zone, ZoneAssessment};

/// Needs assessment agent
#[derive(Debug, Clone)]
pub struct NeedsAssessmentAgent {
    llm: AgentLlm,
    max_concurrent: usize,
    critical_threshold: f64,
    high_threshold: f64,
}

impl NeedsAssessmentAgent {
    pub fn new(backend: Option<Arc<dyn LlmBackend>>, config: &ReliefConfig) -> Self {
        Self {
            llm: AgentLlm::new(backend, config.llm.temperatures.needs_assessment),
            max_concurrent: config.llm.max_concurrent_requests.max(1),
            critical_threshold: config.thresholds.critical_priority,
            high_threshold: config.thresholds.high_priority,
        }
    }

    /// Build the scoring prompt for one zone
    pub fn build_prompt(zone: &Zone) -> String {
        let zone_json = serde_json::to_string_pretty(zone).unwrap_or_default();
        format!(
            "You are an expert humanitarian needs assessment specialist working for the UN.\n\
             Analyze this refugee settlement zone and calculate a priority score from 0-100 (100 = most urgent).\n\
             \n\
             ZONE DATA:\n\
             {zone_json}\n\
             \n\
             ASSESSMENT CRITERIA:\n\
             1. Vulnerable populations (children, elderly, pregnant women, chronic illness) - {vuln:.0} points\n\
             2. Critical shortages (food, water, medical) - {short:.0} points\n\
             3. Time since last aid received - {time:.0} points\n\
             4. Population size and density - {pop:.0} points\n\
             5. Shelter and sanitation conditions - {cond:.0} points\n\
             \n\
             IMPORTANT: Return ONLY valid JSON in this exact format:\n\
             {{\n\
             \x20 \"priority_score\": <number between 0-100>,\n\
             \x20 \"critical_needs\": [\"need1\", \"need2\", \"need3\"],\n\
             \x20 \"vulnerability_score\": <number 0-{vuln:.0}>,\n\
             \x20 \"shortage_score\": <number 0-{short:.0}>,\n\
             \x20 \"time_score\": <number 0-{time:.0}>,\n\
             \x20 \"reasoning\": \"2-3 sentence explanation of priority level\"\n\
             }}\n\
             \n\
             Do not include any text before or after the JSON.",
            vuln = rubric::VULNERABILITY_MAX,
            short = rubric::SHORTAGE_MAX,
            time = rubric::TIME_MAX,
            pop = rubric::POPULATION_MAX,
            cond = rubric::CONDITIONS_MAX,
        )
    }

    /// Assessment used when the model reply cannot be parsed
    pub fn default_assessment(zone: &Zone) -> ZoneAssessment {
        ZoneAssessment {
            zone_id: zone.zone_id.clone(),
            zone_name: zone.zone_name.clone(),
            priority_score: defaults::FALLBACK_PRIORITY_SCORE,
            critical_needs: defaults::FALLBACK_CRITICAL_NEEDS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            vulnerability_score: defaults::FALLBACK_VULNERABILITY_SCORE,
            shortage_score: defaults::FALLBACK_SHORTAGE_SCORE,
            time_score: defaults::FALLBACK_TIME_SCORE,
            reasoning: defaults::FALLBACK_ASSESSMENT_REASONING.to_string(),
        }
    }

    /// Deterministic rubric score for offline runs
    pub fn rubric_score(zone: &Zone) -> ZoneAssessment {
        let population = f64::from(zone.population.max(1));

        let special_cases =
            f64::from(zone.pregnant_women + zone.chronic_illness_cases) / population;
        let vulnerable_share =
            (zone.children_ratio + zone.elderly_ratio + special_cases).clamp(0.0, 1.0);
        let vulnerability = vulnerable_share * rubric::VULNERABILITY_MAX;

        let shortage = (0.40 * zone.food_shortage
            + 0.35 * zone.water_shortage
            + 0.25 * zone.medical_severity)
            .clamp(0.0, 1.0)
            * rubric::SHORTAGE_MAX;

        let waited = f64::from(zone.last_aid_received_days).min(defaults::RUBRIC_FULL_WAIT_DAYS);
        let time = waited / defaults::RUBRIC_FULL_WAIT_DAYS * rubric::TIME_MAX;

        let size = (population / defaults::RUBRIC_FULL_POPULATION).min(1.0) * rubric::POPULATION_MAX;

        let conditions = ((zone.shelter_damage + zone.sanitation_need) / 2.0).clamp(0.0, 1.0)
            * rubric::CONDITIONS_MAX;

        let priority = vulnerability + shortage + time + size + conditions;

        let mut indicators = [
            ("food", zone.food_shortage),
            ("water", zone.water_shortage),
            ("medical", zone.medical_severity),
            ("shelter", zone.shelter_damage),
            ("sanitation", zone.sanitation_need),
        ];
        indicators.sort_by(|a, b| b.1.total_cmp(&a.1));
        let mut critical_needs: Vec<String> = indicators
            .iter()
            .filter(|(_, level)| *level >= defaults::CRITICAL_NEED_LEVEL)
            .take(3)
            .map(|(need, _)| (*need).to_string())
            .collect();
        if critical_needs.is_empty() {
            critical_needs.push(indicators[0].0.to_string());
        }

        let reasoning = format!(
            "Rubric score: vulnerability {:.1}/25, shortages {:.1}/35, time since aid {:.1}/20, \
             population {:.1}/10, shelter and sanitation {:.1}/10. Most pressing: {}.",
            vulnerability,
            shortage,
            time,
            size,
            conditions,
            critical_needs.join(", ")
        );

        let mut assessment = ZoneAssessment {
            zone_id: zone.zone_id.clone(),
            zone_name: zone.zone_name.clone(),
            priority_score: round_to(priority, 1),
            critical_needs,
            vulnerability_score: round_to(vulnerability, 1),
            shortage_score: round_to(shortage, 1),
            time_score: round_to(time, 1),
            reasoning,
        };
        assessment.clamp_scores();
        assessment
    }

    /// Assess a single zone
    pub async fn assess_zone(&self, zone: &Zone) -> Result<ZoneAssessment, LlmError> {
        let Some(reply) = self.llm.ask(&Self::build_prompt(zone)).await? else {
            return Ok(Self::rubric_score(zone));
        };

        match parse_reply::<ZoneAssessment>(&reply) {
            Some(mut assessment) => {
                assessment.zone_id = zone.zone_id.clone();
                assessment.zone_name = zone.zone_name.clone();
                assessment.clamp_scores();
                debug!(
                    zone_id = %zone.zone_id,
                    score = assessment.priority_score,
                    "Zone assessed"
                );
                Ok(assessment)
            }
            None => {
                warn!(
                    zone_id = %zone.zone_id,
                    reply = %preview(&reply, 160),
                    "Could not parse needs assessment reply, using default assessment"
                );
                Ok(Self::default_assessment(zone))
            }
        }
    }

    /// Assess every zone and return them sorted by priority, highest first.
    ///
    /// At most `max_concurrent_requests` requests are in flight. Results keep
    /// zone order until the final stable sort, so ties stay in zone order.
    pub async fn assess_all_zones(&self, zones: &[Zone]) -> Result<Vec<ZoneAssessment>, LlmError> {
        let total = zones.len();
        info!(zones = total, online = self.llm.is_online(), "🔍 Assessing zone needs");

        let mut pending = stream::iter(zones.iter().map(|z| self.assess_zone(z)))
            .buffered(self.max_concurrent);

        let mut assessments = Vec::with_capacity(total);
        while let Some(result) = pending.next().await {
            assessments.push(result?);
            let done = assessments.len();
            if done % defaults::PROGRESS_LOG_EVERY == 0 || done == total {
                info!("   Assessed {}/{} zones...", done, total);
            }
        }

        assessments.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));

        if let Some(top) = assessments.first() {
            info!(
                zone_id = %top.zone_id,
                score = top.priority_score,
                "✓ Assessment complete, highest priority zone identified"
            );
        }
        Ok(assessments)
    }

    /// Zones scoring at or above `threshold`
    pub fn identify_critical_zones(
        assessments: &[ZoneAssessment],
        threshold: f64,
    ) -> Vec<ZoneAssessment> {
        assessments
            .iter()
            .filter(|a| a.priority_score >= threshold)
            .cloned()
            .collect()
    }

    /// Summarise an assessment pass
    pub fn generate_needs_report(&self, assessments: &[ZoneAssessment]) -> NeedsReport {
        let total = assessments.len();
        let critical = assessments
            .iter()
            .filter(|a| a.priority_score >= self.critical_threshold)
            .count();
        let high = assessments
            .iter()
            .filter(|a| {
                a.priority_score >= self.high_threshold && a.priority_score < self.critical_threshold
            })
            .count();
        let average = if total == 0 {
            0.0
        } else {
            assessments.iter().map(|a| a.priority_score).sum::<f64>() / total as f64
        };

        // First-seen order breaks count ties
        let mut tally: Vec<NeedCount> = Vec::new();
        for need in assessments.iter().flat_map(|a| a.critical_needs.iter()) {
            match tally.iter_mut().find(|n| &n.need == need) {
                Some(entry) => entry.count += 1,
                None => tally.push(NeedCount {
                    need: need.clone(),
                    count: 1,
                }),
            }
        }
        tally.sort_by(|a, b| b.count.cmp(&a.count));
        tally.truncate(defaults::COMMON_NEEDS_IN_REPORT);

        NeedsReport {
            total_zones_assessed: total,
            critical_zones: critical,
            high_priority_zones: high,
            average_priority_score: average,
            most_common_needs: tally,
            top_5_priority_zones: assessments
                .iter()
                .take(defaults::TOP_ZONES_IN_REPORT)
                .map(PriorityZoneRef::from)
                .collect(),
        }
    }
}

impl Agent for NeedsAssessmentAgent {
    fn name(&self) -> &'static str {
        "NeedsAssessment"
    }

    fn temperature(&self) -> f32 {
        self.llm.temperature()
    }

    fn is_online(&self) -> bool {
        self.llm.is_online()
    }
}
