//! Operation Configuration - every tunable of the distribution cycle as TOML
//!
//! Each struct implements `Default` with the values the agents were calibrated
//! against, so running without a config file reproduces the reference behavior.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::validation::ValidationWarning;
use crate::types::Scenario;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a relief operation.
///
/// Load with `ReliefConfig::load()` which searches:
/// 1. `$RELIEF_CONFIG` env var
/// 2. `./relief_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReliefConfig {
    /// Operation identification
    #[serde(default)]
    pub operation: OperationInfo,

    /// Settlement simulator and cycle sizing
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Local LLM endpoint and per-agent sampling
    #[serde(default)]
    pub llm: LlmConfig,

    /// Classification thresholds
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Resource allocation rules
    #[serde(default)]
    pub allocation: AllocationConfig,

    /// Vehicle and schedule constants
    #[serde(default)]
    pub logistics: LogisticsConfig,

    /// Result files and dashboards
    #[serde(default)]
    pub output: OutputConfig,
}

impl ReliefConfig {
    /// Load configuration using the standard search order:
    /// 1. `$RELIEF_CONFIG` environment variable
    /// 2. `./relief_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var("RELIEF_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), operation = %config.operation.name, "Loaded config from RELIEF_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from RELIEF_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "RELIEF_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./relief_config.toml
        let local = PathBuf::from("relief_config.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(operation = %config.operation.name, "Loaded config from ./relief_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./relief_config.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No relief_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document, logging unknown-key warnings.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `OLLAMA_BASE_URL` / `OLLAMA_MODEL` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            if !url.trim().is_empty() {
                self.llm.base_url = url.trim().to_string();
            }
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            if !model.trim().is_empty() {
                self.llm.model = model.trim().to_string();
            }
        }
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Relief config saved");
        Ok(())
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Priority bands: high < critical <= 100
    /// - Delivery bands: partial < full <= 100
    /// - Temperatures in [0, 2]
    /// - Zone count fits the A-Z sector naming
    ///
    /// Range warnings are logged; use [`ReliefConfig::check`] to get them back.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for w in self.check()? {
            warn!("{}", w);
        }
        Ok(())
    }

    /// Same rules as `validate`, returning the range warnings instead of
    /// logging them.
    pub fn check(&self) -> Result<Vec<ValidationWarning>, ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let t = &self.thresholds;
        Self::check_band(
            t.high_priority,
            t.critical_priority,
            100.0,
            "thresholds.priority",
            &mut errors,
        );
        Self::check_band(
            t.partial_delivery_percent,
            t.full_delivery_percent,
            100.0,
            "thresholds.delivery",
            &mut errors,
        );

        let s = &self.simulation;
        if s.num_zones == 0 || s.num_zones > MAX_ZONES {
            errors.push(format!(
                "simulation.num_zones = {} must be within 1-{MAX_ZONES}",
                s.num_zones
            ));
        }
        if s.max_zones_per_cycle == 0 {
            errors.push("simulation.max_zones_per_cycle must be > 0".to_string());
        }
        if s.cycles == 0 {
            errors.push("simulation.cycles must be > 0".to_string());
        }

        let l = &self.llm;
        if l.max_concurrent_requests == 0 {
            errors.push("llm.max_concurrent_requests must be > 0".to_string());
        }
        if l.timeout_secs == 0 {
            errors.push("llm.timeout_secs must be > 0".to_string());
        }
        if l.base_url.trim().is_empty() {
            errors.push("llm.base_url must not be empty".to_string());
        }

        // Range validation (temperatures, logistics constants, reserve)
        let (range_errors, range_warnings) = super::validation::validate_ranges(self);
        errors.extend(range_errors);

        // Reject NaN/Inf in any float field
        let g = &self.logistics;
        let floats = [
            t.critical_priority,
            t.high_priority,
            t.full_delivery_percent,
            t.partial_delivery_percent,
            t.trend_band_percent,
            t.success_reference_percent,
            self.allocation.emergency_reserve_fraction,
            g.vehicle_capacity_kg,
            g.fallback_average_speed_kmh,
            g.fallback_handling_hours,
            g.schedule_start_hour,
            g.zone_stop_hours,
            g.route_buffer_hours,
            f64::from(l.temperatures.needs_assessment),
            f64::from(l.temperatures.resource_allocation),
            f64::from(l.temperatures.logistics),
            f64::from(l.temperatures.monitor),
        ];
        if floats.iter().any(|v| !v.is_finite()) {
            errors.push("Config contains NaN or Inf values; all numbers must be finite".to_string());
        }

        if errors.is_empty() {
            Ok(range_warnings)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_band(lower: f64, upper: f64, ceiling: f64, name: &str, errors: &mut Vec<String>) {
        if !lower.is_finite() || !upper.is_finite() {
            errors.push(format!(
                "{name}: values must be finite (got lower={lower}, upper={upper})"
            ));
            return;
        }
        if lower >= upper {
            errors.push(format!(
                "{name}: lower band ({lower:.1}) must be < upper band ({upper:.1})"
            ));
        }
        if upper > ceiling {
            errors.push(format!("{name}: upper band ({upper:.1}) must be <= {ceiling:.0}"));
        }
    }
}

/// Sector names run A..Z
pub const MAX_ZONES: usize = 26;

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Operation Info
// ============================================================================

/// Identification metadata. Appears in logs and dashboard titles only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationInfo {
    #[serde(default = "default_operation_name")]
    pub name: String,
    #[serde(default)]
    pub region: String,
}

fn default_operation_name() -> String {
    "Settlement Aid Distribution".to_string()
}

impl Default for OperationInfo {
    fn default() -> Self {
        Self {
            name: default_operation_name(),
            region: String::new(),
        }
    }
}

// ============================================================================
// Simulation
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Settlement zones to generate
    pub num_zones: usize,
    /// Depot stock scenario
    pub scenario: Scenario,
    /// RNG seed for zones, stock, and delivery simulation
    pub seed: u64,
    /// Zones served per cycle
    pub max_zones_per_cycle: usize,
    /// Cycles per run
    pub cycles: u32,
    /// Feed delivered supplies back into zone shortages between cycles
    pub apply_deliveries: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_zones: 10,
            scenario: Scenario::Normal,
            seed: 42,
            max_zones_per_cycle: 7,
            cycles: 1,
            apply_deliveries: true,
        }
    }
}

// ============================================================================
// LLM
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// When false every agent uses its deterministic path
    pub enabled: bool,
    /// Ollama server root
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Ollama `num_predict` (max generated tokens)
    pub num_predict: u32,
    /// Parallel needs-assessment requests
    pub max_concurrent_requests: usize,
    pub temperatures: AgentTemperatures,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            timeout_secs: 120,
            num_predict: 2048,
            max_concurrent_requests: 1,
            temperatures: AgentTemperatures::default(),
        }
    }
}

/// Sampling temperature per agent. Allocation runs coolest for repeatable
/// plans; the monitor runs warmest for varied recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentTemperatures {
    pub needs_assessment: f32,
    pub resource_allocation: f32,
    pub logistics: f32,
    pub monitor: f32,
}

impl Default for AgentTemperatures {
    fn default() -> Self {
        Self {
            needs_assessment: 0.3,
            resource_allocation: 0.2,
            logistics: 0.3,
            monitor: 0.4,
        }
    }
}

// ============================================================================
// Thresholds
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Priority score at or above which a zone is critical
    pub critical_priority: f64,
    /// Priority score at or above which a zone is high priority
    pub high_priority: f64,
    /// Delivered percentage counted as fully served
    pub full_delivery_percent: f64,
    /// Delivered percentage counted as partially served
    pub partial_delivery_percent: f64,
    /// +/- band around the previous average treated as stable
    pub trend_band_percent: f64,
    /// Reference success rate shown as the gauge delta
    pub success_reference_percent: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            critical_priority: 75.0,
            high_priority: 60.0,
            full_delivery_percent: 95.0,
            partial_delivery_percent: 75.0,
            trend_band_percent: 5.0,
            success_reference_percent: 85.0,
        }
    }
}

// ============================================================================
// Allocation
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Share of every stock held back for emergencies
    pub emergency_reserve_fraction: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            emergency_reserve_fraction: 0.10,
        }
    }
}

// ============================================================================
// Logistics
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticsConfig {
    pub vehicle_capacity_kg: f64,
    /// Zones per route when the plan is built without the LLM
    pub fallback_zones_per_route: usize,
    /// Mixed-surface average used by the fallback time estimate (km/h)
    pub fallback_average_speed_kmh: f64,
    /// Loading plus unloading overhead per fallback route (hours)
    pub fallback_handling_hours: f64,
    /// First departure, hours after midnight
    pub schedule_start_hour: f64,
    /// Travel plus unloading budget per stop (hours)
    pub zone_stop_hours: f64,
    pub unloading_minutes: u32,
    /// Gap between consecutive routes (hours)
    pub route_buffer_hours: f64,
}

impl Default for LogisticsConfig {
    fn default() -> Self {
        Self {
            vehicle_capacity_kg: 3000.0,
            fallback_zones_per_route: 3,
            fallback_average_speed_kmh: 30.0,
            fallback_handling_hours: 2.0,
            schedule_start_hour: 8.0,
            zone_stop_hours: 1.0,
            unloading_minutes: 30,
            route_buffer_hours: 0.5,
        }
    }
}

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Render HTML dashboards after each run
    pub dashboards: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("outputs"),
            dashboards: true,
        }
    }
}
