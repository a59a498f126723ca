//! Config Validation Tests
//!
//! Typo detection on raw TOML and range/band validation on parsed configs,
//! exercised independently from the distribution cycle.

use relief_ops::config::validation::{
    known_config_keys, suggest_correction, validate_ranges, validate_unknown_keys,
};
use relief_ops::config::{ConfigError, ReliefConfig};
use relief_ops::types::Scenario;

// ============================================================================
// Typo Detection Tests
// ============================================================================

#[test]
fn typo_in_threshold_warns_with_suggestion() {
    let toml_str = r#"
[thresholds]
critcal_priority = 80.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("critcal_priority"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("thresholds.critical_priority")
    );
    assert!(warnings[0].to_string().contains("did you mean 'thresholds.critical_priority'"));
}

#[test]
fn typo_in_nested_temperature_table_warns() {
    let toml_str = r#"
[llm.temperatures]
montor = 0.5
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "llm.temperatures.montor");
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("llm.temperatures.monitor")
    );
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[operation]
name = "Camp North"
region = "Border district"

[simulation]
num_zones = 12
scenario = "scarce"
seed = 7
max_zones_per_cycle = 5
cycles = 3

[llm]
model = "llama3.2:3b"
max_concurrent_requests = 2

[llm.temperatures]
needs_assessment = 0.3
monitor = 0.5

[logistics]
vehicle_capacity_kg = 2500.0

[output]
dir = "runs"
dashboards = false
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.is_empty(), "Unexpected warnings: {warnings:?}");
}

#[test]
fn unrelated_key_has_no_suggestion() {
    let warnings = validate_unknown_keys("[weather]\nforecast_source = \"satellite\"\n");
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| w.suggestion.is_none()));
}

#[test]
fn unparseable_toml_yields_no_key_warnings() {
    assert!(validate_unknown_keys("[simulation\nnum_zones = ").is_empty());
}

#[test]
fn every_default_key_is_known() {
    let toml_str = ReliefConfig::default().to_toml().unwrap();
    let warnings = validate_unknown_keys(&toml_str);
    assert!(warnings.is_empty(), "Default config has unknown keys: {warnings:?}");
}

#[test]
fn suggestion_requires_close_match() {
    let known = known_config_keys();
    assert_eq!(
        suggest_correction("output.dashbords", &known).as_deref(),
        Some("output.dashboards")
    );
    assert_eq!(suggest_correction("completely.different", &known), None);
}

// ============================================================================
// Range Validation Tests
// ============================================================================

#[test]
fn defaults_pass_range_validation() {
    let (errors, warnings) = validate_ranges(&ReliefConfig::default());
    assert!(errors.is_empty(), "{errors:?}");
    assert!(warnings.is_empty(), "{warnings:?}");
}

#[test]
fn temperature_above_two_is_an_error() {
    let mut config = ReliefConfig::default();
    config.llm.temperatures.logistics = 2.5;
    let (errors, _) = validate_ranges(&config);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("llm.temperatures.logistics"));
}

#[test]
fn zero_vehicle_capacity_is_an_error() {
    let mut config = ReliefConfig::default();
    config.logistics.vehicle_capacity_kg = 0.0;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("vehicle_capacity_kg")));
}

#[test]
fn large_reserve_only_warns() {
    let mut config = ReliefConfig::default();
    config.allocation.emergency_reserve_fraction = 0.6;
    let (errors, warnings) = validate_ranges(&config);
    assert!(errors.is_empty());
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "allocation.emergency_reserve_fraction");
}

#[test]
fn check_returns_range_warnings_once() {
    let mut config = ReliefConfig::default();
    config.allocation.emergency_reserve_fraction = 0.6;
    let warnings = config.check().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "allocation.emergency_reserve_fraction");
    assert!(config.validate().is_ok());

    config.allocation.emergency_reserve_fraction = 1.0;
    assert!(matches!(config.check(), Err(ConfigError::Validation(_))));
}

#[test]
fn full_reserve_is_an_error() {
    let mut config = ReliefConfig::default();
    config.allocation.emergency_reserve_fraction = 1.0;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("emergency_reserve_fraction")));
}

#[test]
fn serving_more_zones_than_exist_warns() {
    let mut config = ReliefConfig::default();
    config.simulation.num_zones = 4;
    config.simulation.max_zones_per_cycle = 7;
    let (errors, warnings) = validate_ranges(&config);
    assert!(errors.is_empty());
    assert!(warnings.iter().any(|w| w.field == "simulation.max_zones_per_cycle"));
}

// ============================================================================
// Full Parse Tests
// ============================================================================

#[test]
fn partial_file_parses_with_defaults() {
    let config = ReliefConfig::from_toml_str(
        r#"
[simulation]
num_zones = 14
scenario = "abundant"
"#,
    )
    .unwrap();

    assert_eq!(config.simulation.num_zones, 14);
    assert_eq!(config.simulation.scenario, Scenario::Abundant);
    assert_eq!(config.simulation.seed, 42);
    assert_eq!(config.logistics.vehicle_capacity_kg, 3000.0);
    assert_eq!(config.operation.name, "Settlement Aid Distribution");
}

#[test]
fn inverted_priority_bands_are_rejected() {
    let err = ReliefConfig::from_toml_str(
        r#"
[thresholds]
high_priority = 80.0
critical_priority = 70.0
"#,
    )
    .unwrap_err();

    match err {
        ConfigError::Validation(errors) => {
            assert!(errors.iter().any(|e| e.starts_with("thresholds.priority")));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn too_many_zones_are_rejected() {
    let err = ReliefConfig::from_toml_str("[simulation]\nnum_zones = 27\n").unwrap_err();
    assert!(err.to_string().contains("simulation.num_zones = 27"));
}

#[test]
fn wrong_value_type_is_a_parse_error() {
    let err = ReliefConfig::from_toml_str("[simulation]\nnum_zones = \"many\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_, _)));
}

#[test]
fn load_from_file_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relief_config.toml");
    std::fs::write(&path, "[simulation\n").unwrap();

    let err = ReliefConfig::load_from_file(&path).unwrap_err();
    assert!(err.to_string().contains("relief_config.toml"));

    let missing = ReliefConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(missing, ConfigError::Io(_, _)));
}

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.toml");

    let mut config = ReliefConfig::default();
    config.operation.region = "East".to_string();
    config.simulation.cycles = 4;
    config.save_to_file(&path).unwrap();

    let loaded = ReliefConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded.operation.region, "East");
    assert_eq!(loaded.simulation.cycles, 4);
}
