//! HTML Dashboards
//!
//! Self-contained pages that load Plotly from the CDN and embed the figure
//! spec as JSON:
//!
//! - `dashboard_cycle_<n>.html`: six-panel overview of one cycle
//! - `route_map_cycle_<n>.html`: zones, depot and delivery routes
//! - `performance_timeline.html`: success rate and population across cycles

pub mod figures;

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::defaults;
use crate::types::CycleResults;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("I/O error at {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Failed to encode figure: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Nothing to plot: {0}")]
    NoData(&'static str),
}

/// Escape text for an HTML element or attribute
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON safe to embed in a `<script>` element
fn script_json(value: &Value) -> Result<String, DashboardError> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Render one figure as a complete page
pub fn render_page(title: &str, subtitle: &str, figure: &Value) -> Result<String, DashboardError> {
    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <script src="{cdn}"></script>
    <style>
        body {{
            font-family: -apple-system, 'Segoe UI', Helvetica, Arial, sans-serif;
            margin: 0;
            padding: 20px 30px;
            background: #f5f5f5;
        }}
        .header {{
            border-bottom: 3px double #333;
            margin-bottom: 20px;
            padding-bottom: 10px;
        }}
        h1 {{
            margin: 0;
            font-size: 24px;
            letter-spacing: 1px;
        }}
        .subtitle {{
            color: #666;
            font-size: 14px;
            margin-top: 5px;
        }}
        #figure {{
            background: white;
            box-shadow: 0 4px 6px rgba(0,0,0,0.1);
        }}
    </style>
</head>
<body>
    <div class="header">
        <h1>{title}</h1>
        <div class="subtitle">{subtitle}</div>
    </div>
    <div id="figure"></div>
    <script>
        const figure = {json};
        Plotly.newPlot("figure", figure.data, figure.layout, {{responsive: true}});
    </script>
</body>
</html>
"#,
        title = escape_html(title),
        subtitle = escape_html(subtitle),
        cdn = defaults::PLOTLY_CDN_URL,
        json = script_json(figure)?,
    ))
}

fn write_page(path: &Path, html: &str) -> Result<(), DashboardError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| DashboardError::Io(parent.to_path_buf(), e))?;
        }
    }
    std::fs::write(path, html).map_err(|e| DashboardError::Io(path.to_path_buf(), e))
}

fn cycle_subtitle(results: &CycleResults) -> String {
    format!(
        "Scenario: {} | Zones served: {} | Success rate: {:.1}% | Population served: {} | Generated: {}",
        results.resource_scenario,
        results.performance_metrics.zones_served,
        results.performance_metrics.success_rate,
        results.performance_metrics.population_served,
        results.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

/// Six-panel overview of one cycle.
///
/// The gauge delta is measured against `reference_rate`.
pub fn create_comprehensive_dashboard(
    results: &CycleResults,
    path: &Path,
    reference_rate: f64,
) -> Result<(), DashboardError> {
    let figure = figures::comprehensive_figure(results, reference_rate);
    let title = format!("Relief Operations - Cycle #{}", results.cycle_number);
    write_page(path, &render_page(&title, &cycle_subtitle(results), &figure)?)?;
    info!(path = %path.display(), "✓ Dashboard saved");
    Ok(())
}

pub fn create_route_map(results: &CycleResults, path: &Path) -> Result<(), DashboardError> {
    let figure = figures::route_map_figure(results)
        .ok_or(DashboardError::NoData("settlement has no zones"))?;
    let subtitle = format!(
        "Cycle #{} | Routes: {} | Vehicles: {} | Estimated completion: {}",
        results.cycle_number,
        results.logistics_plan.delivery_plan.routes.len(),
        results.logistics_plan.delivery_plan.total_vehicles_needed,
        results.logistics_plan.delivery_plan.estimated_completion,
    );
    write_page(path, &render_page("Delivery Route Map", &subtitle, &figure)?)?;
    info!(path = %path.display(), "✓ Route map saved");
    Ok(())
}

pub fn create_performance_timeline(cycles: &[CycleResults], path: &Path) -> Result<(), DashboardError> {
    if cycles.is_empty() {
        return Err(DashboardError::NoData("no completed cycles"));
    }
    let figure = figures::timeline_figure(cycles);
    let subtitle = format!("Cycles: {}", cycles.len());
    write_page(path, &render_page("Performance Timeline", &subtitle, &figure)?)?;
    info!(path = %path.display(), "✓ Timeline saved");
    Ok(())
}

/// Write the dashboard and route map for one cycle into `dir`
pub fn visualize_results(
    results: &CycleResults,
    dir: &Path,
    reference_rate: f64,
) -> Result<Vec<PathBuf>, DashboardError> {
    info!("📊 Creating visualizations");
    let dashboard = dir.join(format!("dashboard_cycle_{}.html", results.cycle_number));
    let route_map = dir.join(format!("route_map_cycle_{}.html", results.cycle_number));

    create_comprehensive_dashboard(results, &dashboard, reference_rate)?;
    create_route_map(results, &route_map)?;
    Ok(vec![dashboard, route_map])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Z01" & 'Z02'</b>"#),
            "&lt;b&gt;&quot;Z01&quot; &amp; &#39;Z02&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn page_embeds_figure_without_closing_script() {
        let figure = json!({"data": [], "layout": {"title": {"text": "</script><script>alert(1)"}}});
        let html = render_page("A <title>", "sub", &figure).unwrap();

        assert!(html.contains("<title>A &lt;title&gt;</title>"));
        assert!(html.contains(defaults::PLOTLY_CDN_URL));
        assert!(html.contains(r"<\/script><script>alert(1)"));
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn success_colours() {
        assert_eq!(figures::success_color(95.0), "green");
        assert_eq!(figures::success_color(80.0), "orange");
        assert_eq!(figures::success_color(74.9), "red");
    }

    #[test]
    fn empty_timeline_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_performance_timeline(&[], &dir.path().join("t.html")).unwrap_err();
        assert!(matches!(err, DashboardError::NoData(_)));
    }
}
