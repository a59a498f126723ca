//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, "; did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for ReliefConfig.
///
/// Maintained by hand to match the struct hierarchy in relief_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [operation]
        "operation",
        "operation.name",
        "operation.region",
        // [simulation]
        "simulation",
        "simulation.num_zones",
        "simulation.scenario",
        "simulation.seed",
        "simulation.max_zones_per_cycle",
        "simulation.cycles",
        "simulation.apply_deliveries",
        // [llm]
        "llm",
        "llm.enabled",
        "llm.base_url",
        "llm.model",
        "llm.timeout_secs",
        "llm.num_predict",
        "llm.max_concurrent_requests",
        // [llm.temperatures]
        "llm.temperatures",
        "llm.temperatures.needs_assessment",
        "llm.temperatures.resource_allocation",
        "llm.temperatures.logistics",
        "llm.temperatures.monitor",
        // [thresholds]
        "thresholds",
        "thresholds.critical_priority",
        "thresholds.high_priority",
        "thresholds.full_delivery_percent",
        "thresholds.partial_delivery_percent",
        "thresholds.trend_band_percent",
        "thresholds.success_reference_percent",
        // [allocation]
        "allocation",
        "allocation.emergency_reserve_fraction",
        // [logistics]
        "logistics",
        "logistics.vehicle_capacity_kg",
        "logistics.fallback_zones_per_route",
        "logistics.fallback_average_speed_kmh",
        "logistics.fallback_handling_hours",
        "logistics.schedule_start_hour",
        "logistics.zone_stop_hours",
        "logistics.unloading_minutes",
        "logistics.route_buffer_hours",
        // [output]
        "output",
        "output.dir",
        "output.dashboards",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = levenshtein(unknown, k);
        if dist > 3 {
            continue;
        }
        best = match best {
            Some((bk, bd)) if bd < dist || (bd == dist && bk <= k) => Some((bk, bd)),
            _ => Some((k, dist)),
        };
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let mut warnings = Vec::new();

    for key in walk_toml_keys(&value, "") {
        if !known.contains(key.as_str()) {
            let suggestion = suggest_correction(&key, &known);
            let message = format!("Unknown config key '{key}'");
            warnings.push(ValidationWarning {
                field: key,
                message,
                suggestion,
            });
        }
    }

    warnings
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate value ranges on a parsed ReliefConfig.
///
/// Returns (errors, warnings). Errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_ranges(config: &super::ReliefConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let temps = &config.llm.temperatures;
    for (name, value) in [
        ("needs_assessment", temps.needs_assessment),
        ("resource_allocation", temps.resource_allocation),
        ("logistics", temps.logistics),
        ("monitor", temps.monitor),
    ] {
        if !(0.0..=2.0).contains(&value) {
            errors.push(format!(
                "llm.temperatures.{name} = {value:.2} is outside the sampling range (0-2)"
            ));
        }
    }

    let reserve = config.allocation.emergency_reserve_fraction;
    if !(0.0..1.0).contains(&reserve) {
        errors.push(format!(
            "allocation.emergency_reserve_fraction = {reserve:.2} must be within [0, 1)"
        ));
    } else if reserve > 0.5 {
        warnings.push(ValidationWarning {
            field: "allocation.emergency_reserve_fraction".to_string(),
            message: format!(
                "emergency_reserve_fraction = {reserve:.2} withholds more than half of every stock"
            ),
            suggestion: None,
        });
    }

    let l = &config.logistics;
    if l.vehicle_capacity_kg <= 0.0 {
        errors.push(format!(
            "logistics.vehicle_capacity_kg = {:.1} must be > 0 (used as divisor)",
            l.vehicle_capacity_kg
        ));
    }
    if l.fallback_average_speed_kmh <= 0.0 {
        errors.push(format!(
            "logistics.fallback_average_speed_kmh = {:.1} must be > 0 (used as divisor)",
            l.fallback_average_speed_kmh
        ));
    }
    if l.fallback_zones_per_route == 0 {
        errors.push("logistics.fallback_zones_per_route must be > 0".to_string());
    }
    if !(0.0..24.0).contains(&l.schedule_start_hour) {
        errors.push(format!(
            "logistics.schedule_start_hour = {:.2} must be within [0, 24)",
            l.schedule_start_hour
        ));
    }
    if l.zone_stop_hours <= 0.0 {
        errors.push("logistics.zone_stop_hours must be > 0".to_string());
    }
    if l.route_buffer_hours < 0.0 || l.fallback_handling_hours < 0.0 {
        errors.push("logistics durations cannot be negative".to_string());
    }
    if f64::from(l.unloading_minutes) > l.zone_stop_hours * 60.0 {
        warnings.push(ValidationWarning {
            field: "logistics.unloading_minutes".to_string(),
            message: format!(
                "unloading_minutes = {} exceeds the per-stop budget of {:.0} minutes",
                l.unloading_minutes,
                l.zone_stop_hours * 60.0
            ),
            suggestion: None,
        });
    }

    let s = &config.simulation;
    if s.max_zones_per_cycle > s.num_zones && s.num_zones > 0 {
        warnings.push(ValidationWarning {
            field: "simulation.max_zones_per_cycle".to_string(),
            message: format!(
                "max_zones_per_cycle = {} exceeds num_zones = {}; every zone will be served",
                s.max_zones_per_cycle, s.num_zones
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
