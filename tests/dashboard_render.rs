//! Dashboard Rendering Tests
//!
//! Renders pages from real offline cycles and checks the files and the
//! embedded figure specs.

use relief_ops::agents::AidOrchestrator;
use relief_ops::config::defaults::PLOTLY_CDN_URL;
use relief_ops::config::ReliefConfig;
use relief_ops::dashboard::{self, figures, DashboardError};
use relief_ops::types::{CycleResults, ResourceKind};

async fn offline_cycles(n: u32) -> Vec<CycleResults> {
    let mut config = ReliefConfig::default();
    config.simulation.num_zones = 9;
    config.simulation.seed = 17;
    let mut orch = AidOrchestrator::new(config, None);
    for cycle in 1..=n {
        orch.run_distribution_cycle(cycle, 6).await.unwrap();
    }
    orch.history().to_vec()
}

#[tokio::test]
async fn visualize_results_writes_both_pages() {
    let dir = tempfile::tempdir().unwrap();
    let mut results = offline_cycles(1).await.remove(0);
    results.logistics_plan.delivery_plan.estimated_completion = "Day <1> & 2".to_string();

    let out = dir.path().join("charts");
    let files = dashboard::visualize_results(&results, &out, 85.0).unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(files[0], out.join("dashboard_cycle_1.html"));
    assert_eq!(files[1], out.join("route_map_cycle_1.html"));

    let page = std::fs::read_to_string(&files[0]).unwrap();
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains(PLOTLY_CDN_URL));
    assert!(page.contains("Relief Operations - Cycle #1"));
    assert!(page.contains("Plotly.newPlot"));

    let map = std::fs::read_to_string(&files[1]).unwrap();
    assert!(map.contains("Day &lt;1&gt; &amp; 2"));
    assert!(map.contains("scattergeo"));
}

#[tokio::test]
async fn comprehensive_figure_has_six_panels() {
    let results = offline_cycles(1).await.remove(0);
    let figure = figures::comprehensive_figure(&results, 85.0);

    let traces = figure["data"].as_array().unwrap();
    assert_eq!(traces.len(), 6);
    let kinds: Vec<&str> = traces.iter().filter_map(|t| t["type"].as_str()).collect();
    assert_eq!(kinds, vec!["bar", "pie", "bar", "bar", "pie", "indicator"]);

    let gauge = &traces[5];
    assert_eq!(gauge["value"].as_f64(), Some(results.performance_metrics.success_rate));
    assert_eq!(gauge["delta"]["reference"].as_f64(), Some(85.0));
}

#[tokio::test]
async fn zeroed_kind_keeps_its_place_in_resource_panels() {
    let mut results = offline_cycles(1).await.remove(0);
    for alloc in &mut results.resource_allocation.allocations {
        alloc.supplies.water_liters = 0;
    }

    let totals = figures::resource_totals(&results);
    assert_eq!(totals.len(), 6);
    assert_eq!(totals[1], (ResourceKind::WaterLiters, 0));

    let figure = figures::comprehensive_figure(&results, 85.0);
    let breakdown = &figure["data"][3];
    let kinds: Vec<&str> = breakdown["x"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|k| k.as_str())
        .collect();
    assert_eq!(
        kinds,
        vec!["food_packages", "water_liters", "medical_kits", "shelter_materials", "blankets"]
    );
    assert_eq!(breakdown["y"][1].as_u64(), Some(0));
}

#[tokio::test]
async fn route_map_draws_one_line_per_route() {
    let results = offline_cycles(1).await.remove(0);
    let figure = figures::route_map_figure(&results).unwrap();

    let traces = figure["data"].as_array().unwrap();
    // Zones, depot, then one trace per route
    let routes = results.logistics_plan.delivery_plan.routes.len();
    assert_eq!(traces.len(), 2 + routes);
    assert_eq!(traces[1]["name"], "Depot");

    let (lat, lon) = figures::depot_position(&results.settlement_data.zones_data).unwrap();
    assert_eq!(traces[1]["lat"][0].as_f64(), Some(lat));
    assert_eq!(traces[1]["lon"][0].as_f64(), Some(lon));
}

#[tokio::test]
async fn timeline_spans_every_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let cycles = offline_cycles(3).await;
    let path = dir.path().join("performance_timeline.html");

    dashboard::create_performance_timeline(&cycles, &path).unwrap();
    let page = std::fs::read_to_string(&path).unwrap();
    assert!(page.contains("Cycles: 3"));

    let figure = figures::timeline_figure(&cycles);
    let rates = figure["data"][0]["y"].as_array().unwrap();
    assert_eq!(rates.len(), 3);
    assert_eq!(rates[2].as_f64(), Some(cycles[2].performance_metrics.success_rate));
}

#[tokio::test]
async fn settlement_without_zones_has_no_route_map() {
    let dir = tempfile::tempdir().unwrap();
    let mut results = offline_cycles(1).await.remove(0);
    results.settlement_data.zones_data.clear();

    let err = dashboard::create_route_map(&results, &dir.path().join("map.html")).unwrap_err();
    assert!(matches!(err, DashboardError::NoData(_)));
}
