//! System-wide default constants.
//!
//! Values the operator has no reason to tune, grouped by subsystem.

// ============================================================================
// Needs Assessment
// ============================================================================

/// Log assessment progress every N zones.
pub const PROGRESS_LOG_EVERY: usize = 3;

/// Priority used when a zone's reply cannot be parsed.
pub const FALLBACK_PRIORITY_SCORE: f64 = 50.0;

/// Sub-scores used when a zone's reply cannot be parsed.
pub const FALLBACK_VULNERABILITY_SCORE: f64 = 12.0;
pub const FALLBACK_SHORTAGE_SCORE: f64 = 18.0;
pub const FALLBACK_TIME_SCORE: f64 = 10.0;

pub const FALLBACK_ASSESSMENT_REASONING: &str = "Default assessment due to processing error";

/// Needs listed when a zone's reply cannot be parsed.
pub const FALLBACK_CRITICAL_NEEDS: [&str; 2] = ["food", "water"];

/// Zones listed in the report's top-priority table.
pub const TOP_ZONES_IN_REPORT: usize = 5;

/// Needs listed in the report's most-common table.
pub const COMMON_NEEDS_IN_REPORT: usize = 5;

/// A need indicator at or above this value is listed as critical by the
/// deterministic scorer.
pub const CRITICAL_NEED_LEVEL: f64 = 0.5;

/// Population that earns the full population component of the rubric.
pub const RUBRIC_FULL_POPULATION: f64 = 3_000.0;

/// Days without aid that earn the full time component of the rubric.
pub const RUBRIC_FULL_WAIT_DAYS: f64 = 30.0;

// ============================================================================
// Resource Allocation
// ============================================================================

pub const FALLBACK_ALLOCATION_JUSTIFICATION: &str = "Proportional allocation based on priority rank";

// ============================================================================
// Logistics
// ============================================================================

/// Distance assumed for a zone missing from the settlement table (km).
pub const FALLBACK_UNKNOWN_DISTANCE_KM: f64 = 10.0;

pub const FALLBACK_ESTIMATED_COMPLETION: &str = "Day 1-2";

pub const FALLBACK_LOGISTICS_SUMMARY: &str = "Fallback routing plan";

pub const FALLBACK_ROUTE_NOTES: &str = "Standard delivery route";

pub const FALLBACK_POTENTIAL_CHALLENGES: [&str; 2] = ["Weather dependent", "Road conditions"];

/// Driving hours allowed per vehicle, quoted in the routing prompt.
pub const MAX_DRIVING_HOURS: f64 = 8.0;

// ============================================================================
// Monitoring
// ============================================================================

pub const FALLBACK_RECOMMENDATIONS: [&str; 2] = ["Review delivery constraints", "Improve route planning"];

pub const FALLBACK_PERFORMANCE_INSIGHTS: &str = "Fallback analysis generated";

pub const FALLBACK_PRIORITY_ADJUSTMENTS: &str = "Increase focus on under-served zones";

pub const FALLBACK_REALLOCATION_REASON: &str = "Follow-up delivery required";

/// Success rate counted as a success in lessons learned (%).
pub const LESSONS_SUCCESS_RATE: f64 = 80.0;

/// Recommendations carried into lessons learned as best practices.
pub const LESSONS_BEST_PRACTICES: usize = 3;

// ============================================================================
// Dashboards
// ============================================================================

/// Zones shown in the priority bar chart.
pub const DASHBOARD_PRIORITY_ZONES: usize = 10;

/// Supply kinds shown in the resource bar chart.
pub const DASHBOARD_RESOURCE_KINDS: usize = 5;

/// Gauge threshold line (%).
pub const DASHBOARD_GAUGE_THRESHOLD: f64 = 90.0;

/// Population per unit of marker size on the route map.
pub const MAP_POPULATION_PER_MARKER_UNIT: f64 = 100.0;

/// Plotly bundle loaded by every dashboard page.
pub const PLOTLY_CDN_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
