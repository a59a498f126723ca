//! Plotly figure specs built as `serde_json` values.
//!
//! Each builder returns `{"data": [...], "layout": {...}}`, ready for
//! `Plotly.newPlot`.

use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::config::defaults;
use crate::types::{CycleResults, DeliveryChallenge, ResourceKind, Zone};

/// Plotly "Set1" qualitative palette
const ROUTE_COLORS: [&str; 9] = [
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33", "#a65628", "#f781bf",
    "#999999",
];

/// Plotly "Set3" qualitative palette
const RESOURCE_COLORS: [&str; 6] = ["#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462"];

/// Plotly "Pastel" qualitative palette
const CHALLENGE_COLORS: [&str; 5] = ["#66c5cc", "#f6cf71", "#f89c74", "#dcb0f2", "#87c55f"];

/// Bar colour for a delivered percentage
pub fn success_color(delivered_percentage: f64) -> &'static str {
    if delivered_percentage >= 95.0 {
        "green"
    } else if delivered_percentage >= 75.0 {
        "orange"
    } else {
        "red"
    }
}

/// Allocated quantity per kind, canonical order, zero totals included
pub fn resource_totals(results: &CycleResults) -> Vec<(ResourceKind, u64)> {
    ResourceKind::ALL
        .iter()
        .map(|&kind| {
            let total = results
                .resource_allocation
                .allocations
                .iter()
                .fold(0u64, |acc, a| acc.saturating_add(a.supplies.get(kind)));
            (kind, total)
        })
        .collect()
}

/// Outcomes per challenge, including deliveries with none
pub fn challenge_counts(results: &CycleResults) -> BTreeMap<DeliveryChallenge, usize> {
    let mut counts = BTreeMap::new();
    for o in &results.delivery_outcomes.actual_results {
        *counts.entry(o.challenges).or_insert(0) += 1;
    }
    counts
}

/// Six-panel cycle dashboard on a 3x2 grid
pub fn comprehensive_figure(results: &CycleResults, reference_rate: f64) -> Value {
    // Row bands, top to bottom, with gaps for subplot titles
    const ROWS: [[f64; 2]; 3] = [[0.70, 1.0], [0.36, 0.64], [0.0, 0.28]];
    const LEFT: [f64; 2] = [0.0, 0.45];
    const RIGHT: [f64; 2] = [0.55, 1.0];

    let top_zones: Vec<_> = results
        .needs_assessment
        .prioritized_zones
        .iter()
        .take(defaults::DASHBOARD_PRIORITY_ZONES)
        .collect();
    let totals = resource_totals(results);
    let outcomes = &results.delivery_outcomes.actual_results;
    let challenges = challenge_counts(results);
    let breakdown: Vec<_> = totals.iter().take(defaults::DASHBOARD_RESOURCE_KINDS).collect();

    let data = vec![
        json!({
            "type": "bar",
            "x": top_zones.iter().map(|z| z.zone_id.as_str()).collect::<Vec<_>>(),
            "y": top_zones.iter().map(|z| z.priority_score).collect::<Vec<_>>(),
            "text": top_zones.iter().map(|z| format!("{:.0}", z.priority_score)).collect::<Vec<_>>(),
            "textposition": "outside",
            "marker": {"color": "indianred"},
            "name": "Priority Score",
            "hovertemplate": "<b>%{x}</b><br>Priority: %{y:.1f}<extra></extra>",
            "xaxis": "x",
            "yaxis": "y",
        }),
        json!({
            "type": "pie",
            "labels": totals.iter().map(|(k, _)| k.key()).collect::<Vec<_>>(),
            "values": totals.iter().map(|(_, v)| *v).collect::<Vec<_>>(),
            "hole": 0.3,
            "marker": {"colors": RESOURCE_COLORS},
            "hovertemplate": "<b>%{label}</b><br>Quantity: %{value:,}<br>Percentage: %{percent}<extra></extra>",
            "domain": {"x": RIGHT, "y": ROWS[0]},
        }),
        json!({
            "type": "bar",
            "x": outcomes.iter().map(|o| o.zone_id.as_str()).collect::<Vec<_>>(),
            "y": outcomes.iter().map(|o| o.delivered_percentage).collect::<Vec<_>>(),
            "text": outcomes.iter().map(|o| format!("{:.0}%", o.delivered_percentage)).collect::<Vec<_>>(),
            "textposition": "outside",
            "marker": {"color": outcomes.iter().map(|o| success_color(o.delivered_percentage)).collect::<Vec<_>>()},
            "name": "Delivery Success",
            "hovertemplate": "<b>%{x}</b><br>Delivered: %{y:.1f}%<extra></extra>",
            "xaxis": "x2",
            "yaxis": "y2",
        }),
        json!({
            "type": "bar",
            "x": breakdown.iter().map(|(k, _)| k.key()).collect::<Vec<_>>(),
            "y": breakdown.iter().map(|(_, v)| *v).collect::<Vec<_>>(),
            "text": breakdown.iter().map(|(_, v)| v.to_string()).collect::<Vec<_>>(),
            "textposition": "outside",
            "marker": {"color": "lightseagreen"},
            "name": "Resources",
            "hovertemplate": "<b>%{x}</b><br>Quantity: %{y:,}<extra></extra>",
            "xaxis": "x3",
            "yaxis": "y3",
        }),
        json!({
            "type": "pie",
            "labels": challenges.keys().map(|c| c.as_str()).collect::<Vec<_>>(),
            "values": challenges.values().copied().collect::<Vec<_>>(),
            "hole": 0.3,
            "marker": {"colors": CHALLENGE_COLORS},
            "hovertemplate": "<b>%{label}</b><br>Count: %{value}<br>Percentage: %{percent}<extra></extra>",
            "domain": {"x": LEFT, "y": ROWS[2]},
        }),
        json!({
            "type": "indicator",
            "mode": "gauge+number+delta",
            "value": results.performance_metrics.success_rate,
            "title": {"text": "Overall Success Rate"},
            "delta": {"reference": reference_rate},
            "gauge": {
                "axis": {"range": [null, 100]},
                "bar": {"color": "darkblue"},
                "steps": [
                    {"range": [0, 60], "color": "lightgray"},
                    {"range": [60, 80], "color": "lightblue"},
                    {"range": [80, 100], "color": "lightgreen"},
                ],
                "threshold": {
                    "line": {"color": "red", "width": 4},
                    "thickness": 0.75,
                    "value": defaults::DASHBOARD_GAUGE_THRESHOLD,
                },
            },
            "domain": {"x": RIGHT, "y": ROWS[2]},
        }),
    ];

    let title = |text: &str, x: [f64; 2], y: [f64; 2]| {
        json!({
            "text": format!("<b>{text}</b>"),
            "x": (x[0] + x[1]) / 2.0,
            "y": y[1] + 0.02,
            "xref": "paper",
            "yref": "paper",
            "xanchor": "center",
            "yanchor": "bottom",
            "showarrow": false,
        })
    };

    let layout = json!({
        "title": {
            "text": format!("Relief Operations - Cycle #{} Dashboard", results.cycle_number),
            "font": {"size": 20},
        },
        "showlegend": false,
        "height": 1200,
        "template": "plotly_white",
        "xaxis": {"domain": LEFT, "anchor": "y", "title": {"text": "Zone ID"}},
        "yaxis": {"domain": ROWS[0], "anchor": "x", "title": {"text": "Priority Score"}},
        "xaxis2": {"domain": LEFT, "anchor": "y2", "title": {"text": "Zone ID"}},
        "yaxis2": {"domain": ROWS[1], "anchor": "x2", "title": {"text": "Delivery %"}},
        "xaxis3": {"domain": RIGHT, "anchor": "y3", "title": {"text": "Resource Type"}},
        "yaxis3": {"domain": ROWS[1], "anchor": "x3", "title": {"text": "Quantity"}},
        "annotations": [
            title("Zone Priority Scores", LEFT, ROWS[0]),
            title("Resource Allocation Distribution", RIGHT, ROWS[0]),
            title("Delivery Success by Zone", LEFT, ROWS[1]),
            title("Resource Type Breakdown", RIGHT, ROWS[1]),
            title("Challenges Encountered", LEFT, ROWS[2]),
            title("Population Coverage", RIGHT, ROWS[2]),
        ],
    });

    json!({"data": data, "layout": layout})
}

/// Mean zone position, used as the depot. `None` without zones.
pub fn depot_position(zones: &[Zone]) -> Option<(f64, f64)> {
    if zones.is_empty() {
        return None;
    }
    let n = zones.len() as f64;
    let lat = zones.iter().map(|z| z.latitude).sum::<f64>() / n;
    let lon = zones.iter().map(|z| z.longitude).sum::<f64>() / n;
    Some((lat, lon))
}

/// Geo scatter of zones, the depot and every route as a closed loop
pub fn route_map_figure(results: &CycleResults) -> Option<Value> {
    let zones = &results.settlement_data.zones_data;
    let (depot_lat, depot_lon) = depot_position(zones)?;

    let mut data = vec![
        json!({
            "type": "scattergeo",
            "lon": zones.iter().map(|z| z.longitude).collect::<Vec<_>>(),
            "lat": zones.iter().map(|z| z.latitude).collect::<Vec<_>>(),
            "text": zones.iter().map(|z| z.zone_name.as_str()).collect::<Vec<_>>(),
            "mode": "markers+text",
            "textposition": "top center",
            "marker": {
                "size": zones
                    .iter()
                    .map(|z| f64::from(z.population) / defaults::MAP_POPULATION_PER_MARKER_UNIT)
                    .collect::<Vec<_>>(),
                "color": "lightblue",
                "line": {"width": 1, "color": "darkblue"},
            },
            "name": "Settlement Zones",
        }),
        json!({
            "type": "scattergeo",
            "lon": [depot_lon],
            "lat": [depot_lat],
            "text": ["Distribution Center"],
            "mode": "markers+text",
            "textposition": "top center",
            "marker": {"size": 20, "color": "red", "symbol": "square"},
            "name": "Depot",
        }),
    ];

    for (i, route) in results.logistics_plan.delivery_plan.routes.iter().enumerate() {
        let stops: Vec<&Zone> = route
            .zones_sequence
            .iter()
            .filter_map(|id| zones.iter().find(|z| &z.zone_id == id))
            .collect();

        let mut lons = vec![depot_lon];
        let mut lats = vec![depot_lat];
        lons.extend(stops.iter().map(|z| z.longitude));
        lats.extend(stops.iter().map(|z| z.latitude));
        lons.push(depot_lon);
        lats.push(depot_lat);

        data.push(json!({
            "type": "scattergeo",
            "lon": lons,
            "lat": lats,
            "mode": "lines",
            "line": {"width": 2, "color": ROUTE_COLORS[i % ROUTE_COLORS.len()]},
            "name": format!("Route {}", route.route_id),
        }));
    }

    let layout = json!({
        "title": {"text": "Delivery Route Map"},
        "height": 700,
        "geo": {
            "projection": {"type": "mercator", "scale": 50},
            "showland": true,
            "landcolor": "rgb(243, 243, 243)",
            "coastlinecolor": "rgb(204, 204, 204)",
            "center": {"lon": depot_lon, "lat": depot_lat},
        },
    });

    Some(json!({"data": data, "layout": layout}))
}

/// Success rate (line) and population served (bar) per cycle
pub fn timeline_figure(cycles: &[CycleResults]) -> Value {
    let numbers: Vec<u32> = cycles.iter().map(|c| c.cycle_number).collect();

    let data = json!([
        {
            "type": "scatter",
            "mode": "lines+markers",
            "x": numbers,
            "y": cycles.iter().map(|c| c.performance_metrics.success_rate).collect::<Vec<_>>(),
            "name": "Success Rate",
            "line": {"color": "green", "width": 3},
            "marker": {"size": 10},
            "xaxis": "x",
            "yaxis": "y",
        },
        {
            "type": "bar",
            "x": numbers,
            "y": cycles.iter().map(|c| c.performance_metrics.population_served).collect::<Vec<_>>(),
            "name": "Population",
            "marker": {"color": "lightblue"},
            "xaxis": "x2",
            "yaxis": "y2",
        },
    ]);

    let layout = json!({
        "title": {"text": "Performance Timeline"},
        "height": 800,
        "showlegend": false,
        "xaxis": {"domain": [0.0, 1.0], "anchor": "y", "dtick": 1},
        "yaxis": {"domain": [0.58, 1.0], "anchor": "x", "title": {"text": "Success Rate (%)"}},
        "xaxis2": {"domain": [0.0, 1.0], "anchor": "y2", "dtick": 1, "title": {"text": "Cycle Number"}},
        "yaxis2": {"domain": [0.0, 0.42], "anchor": "x2", "title": {"text": "Population Served"}},
        "annotations": [
            {"text": "<b>Success Rate Over Time</b>", "x": 0.5, "y": 1.02, "xref": "paper", "yref": "paper", "xanchor": "center", "yanchor": "bottom", "showarrow": false},
            {"text": "<b>Population Served Over Time</b>", "x": 0.5, "y": 0.44, "xref": "paper", "yref": "paper", "xanchor": "center", "yanchor": "bottom", "showarrow": false},
        ],
    });

    json!({"data": data, "layout": layout})
}
