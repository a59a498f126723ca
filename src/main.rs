//! RELIEF-OPS - Aid Distribution Orchestrator
//!
//! Plans relief deliveries for a simulated refugee settlement with four
//! cooperating agents backed by a local Ollama model.
//!
//! # Usage
//!
//! ```bash
//! # One cycle against a local Ollama server
//! relief-ops
//!
//! # Three cycles, scarce stock, no LLM
//! relief-ops run --cycles 3 --scenario scarce --offline
//!
//! # Re-render dashboards from a saved cycle
//! relief-ops render outputs/cycle_1_20250101_120000.json
//!
//! # Validate a config file
//! relief-ops check-config relief_config.toml
//! ```
//!
//! # Environment Variables
//!
//! - `RELIEF_CONFIG`: Path to the TOML config file
//! - `OLLAMA_BASE_URL`: Ollama server root (default: http://localhost:11434)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2:3b)
//! - `RELIEF_LOG_FORMAT`: `text` or `json` (same as `--log-format`)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use relief_ops::agents::AidOrchestrator;
use relief_ops::config::{self, validation, ReliefConfig};
use relief_ops::llm::{LlmBackend, OllamaBackend};
use relief_ops::types::{CycleResults, Scenario};
use relief_ops::{dashboard, storage};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "relief-ops")]
#[command(about = "RELIEF-OPS Multi-Agent Aid Distribution Orchestrator")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct CliArgs {
    /// Log output format
    #[arg(long, value_enum, env = "RELIEF_LOG_FORMAT", default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<SubCommand>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Run one or more distribution cycles (default)
    Run(RunArgs),

    /// Re-render the dashboards from a saved cycle results file
    Render {
        /// Path to a cycle_<n>_<timestamp>.json file
        results: PathBuf,
        /// Directory for the HTML files (default: next to the results file)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Config file path (overrides RELIEF_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Load and validate a config file without running anything
    CheckConfig {
        /// Config file (default: ./relief_config.toml)
        path: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// Number of settlement zones (1-26)
    #[arg(long)]
    zones: Option<usize>,

    /// Depot stock scenario: abundant, normal or scarce
    #[arg(long)]
    scenario: Option<Scenario>,

    /// Maximum zones served per cycle
    #[arg(long)]
    max_zones: Option<usize>,

    /// Number of distribution cycles
    #[arg(long)]
    cycles: Option<u32>,

    /// RNG seed for the settlement and delivery simulation
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for results, dashboards and exports
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Config file path (overrides RELIEF_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run without the LLM; every agent uses its deterministic planner
    #[arg(long)]
    offline: bool,

    /// Skip HTML dashboard generation
    #[arg(long)]
    no_dashboard: bool,

    /// Write the generated settlement zones to <output-dir>/zones.csv
    #[arg(long)]
    export_zones: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl RunArgs {
    /// Overlay command-line flags onto the loaded config
    fn apply(&self, cfg: &mut ReliefConfig) {
        if let Some(zones) = self.zones {
            cfg.simulation.num_zones = zones;
        }
        if let Some(scenario) = self.scenario {
            cfg.simulation.scenario = scenario;
        }
        if let Some(max_zones) = self.max_zones {
            cfg.simulation.max_zones_per_cycle = max_zones;
        }
        if let Some(cycles) = self.cycles {
            cfg.simulation.cycles = cycles;
        }
        if let Some(seed) = self.seed {
            cfg.simulation.seed = seed;
        }
        if let Some(dir) = &self.output_dir {
            cfg.output.dir = dir.clone();
        }
        if self.offline {
            cfg.llm.enabled = false;
        }
        if self.no_dashboard {
            cfg.output.dashboards = false;
        }
    }
}

// ============================================================================
// Startup helpers
// ============================================================================

fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
    }
}

/// Explicit `--config` file, else the usual lookup chain
fn load_base_config(path: Option<&Path>) -> Result<ReliefConfig> {
    let mut cfg = match path {
        Some(path) => ReliefConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ReliefConfig::load(),
    };
    cfg.apply_env_overrides();
    Ok(cfg)
}

fn load_config(args: &RunArgs) -> Result<ReliefConfig> {
    let mut cfg = load_base_config(args.config.as_deref())?;
    args.apply(&mut cfg);
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}

fn print_banner(cfg: &ReliefConfig) {
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  RELIEF-OPS - Aid Distribution Orchestrator");
    info!("  Multi-Agent Planning for Refugee Settlement Operations");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("");
    info!("📋 Operation: {}", cfg.operation.name);
    if !cfg.operation.region.is_empty() {
        info!("   Region: {}", cfg.operation.region);
    }
    info!("   Settlement zones:    {}", cfg.simulation.num_zones);
    info!("   Resource scenario:   {}", cfg.simulation.scenario);
    info!("   Max zones per cycle: {}", cfg.simulation.max_zones_per_cycle);
    info!("   Cycles:              {}", cfg.simulation.cycles);
    info!("   Seed:                {}", cfg.simulation.seed);
    info!("   Output directory:    {}", cfg.output.dir.display());
    info!("");
}

/// Build the Ollama backend, or `None` in offline mode.
///
/// The health check only warns; an unreachable server surfaces as an error
/// on the first agent request.
async fn connect_backend(cfg: &ReliefConfig) -> Result<Option<Arc<dyn LlmBackend>>> {
    if !cfg.llm.enabled {
        info!("🖥️  LLM: disabled (deterministic planners)");
        info!("");
        return Ok(None);
    }

    let backend = OllamaBackend::new(&cfg.llm).context("building Ollama client")?;
    info!("🖥️  LLM: Ollama at {} (model {})", backend.base_url(), cfg.llm.model);

    match backend.has_model().await {
        Ok(true) => info!("   ✓ Model available"),
        Ok(false) => warn!(
            model = %cfg.llm.model,
            "⚠️  Model not installed on the server, run `ollama pull {}`",
            cfg.llm.model
        ),
        Err(e) => {
            warn!(error = %e, "⚠️  Ollama not reachable, start it with `ollama serve` or pass --offline");
        }
    }
    info!("");

    let backend: Arc<dyn LlmBackend> = Arc::new(backend);
    Ok(Some(backend))
}

// ============================================================================
// Commands
// ============================================================================

async fn run(args: &RunArgs, cancel: CancellationToken) -> Result<()> {
    config::init(load_config(args)?);
    let cfg = config::get();
    print_banner(cfg);

    let backend = connect_backend(cfg).await?;
    let mut orchestrator = AidOrchestrator::new(cfg.clone(), backend);
    let output_dir = cfg.output.dir.clone();
    let reference_rate = cfg.thresholds.success_reference_percent;
    let mut outputs: Vec<PathBuf> = Vec::new();

    if args.export_zones {
        let path = output_dir.join("zones.csv");
        orchestrator
            .simulator()
            .export_zones_csv(&path)
            .context("exporting zones")?;
        outputs.push(path);
    }

    let max_zones = cfg.simulation.max_zones_per_cycle;
    let latest: CycleResults = if cfg.simulation.cycles == 1 {
        let results = tokio::select! {
            biased;
            _ = cancel.cancelled() => bail!("interrupted during cycle 1"),
            r = orchestrator.run_distribution_cycle(1, max_zones) => r?,
        };
        outputs.push(orchestrator.save_results(&results, &output_dir)?);
        results
    } else {
        outputs.extend(
            orchestrator
                .run_multiple_cycles(cfg.simulation.cycles, max_zones, cancel.clone())
                .await?,
        );

        if let Some(summary) = orchestrator.generate_summary_report() {
            info!("══════════════════════════════════════════════════════════════════════");
            info!("MULTI-CYCLE SUMMARY REPORT");
            info!("══════════════════════════════════════════════════════════════════════");
            info!("Total cycles:            {}", summary.total_cycles_completed);
            info!("Average success rate:    {:.1}%", summary.average_success_rate);
            info!("Total population served: {}", summary.total_population_served);
            info!(
                "Best cycle:              #{} ({:.1}%)",
                summary.best_cycle.cycle_number, summary.best_cycle.success_rate
            );
            info!("{}", summary.summary);
        }

        orchestrator
            .history()
            .last()
            .cloned()
            .context("no cycle completed")?
    };

    if cfg.output.dashboards {
        outputs.extend(dashboard::visualize_results(&latest, &output_dir, reference_rate)?);
        if orchestrator.history().len() > 1 {
            let path = output_dir.join("performance_timeline.html");
            dashboard::create_performance_timeline(orchestrator.history(), &path)?;
            outputs.push(path);
        }
    }

    info!("");
    info!("✓ RELIEF-OPS run completed successfully");
    info!("📁 Output files:");
    for path in &outputs {
        info!("   • {}", path.display());
    }
    if cfg.output.dashboards {
        info!("💡 Open the HTML files in a browser to explore the dashboards");
    }
    Ok(())
}

fn render(results_path: &Path, output_dir: Option<&Path>, config_path: Option<&Path>) -> Result<()> {
    let results = storage::load_results(results_path)?;
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| results_path.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    let cfg = load_base_config(config_path)?;
    cfg.validate().context("invalid configuration")?;
    config::init(cfg);
    let reference_rate = config::get().thresholds.success_reference_percent;
    for path in dashboard::visualize_results(&results, &dir, reference_rate)? {
        info!("   • {}", path.display());
    }
    Ok(())
}

fn check_config(path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or_else(|| Path::new("relief_config.toml"));
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;

    let unknown = validation::validate_unknown_keys(&raw);
    for w in &unknown {
        println!("⚠️  {}", w);
    }

    let cfg: ReliefConfig = toml::from_str(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;
    let warnings = match cfg.check() {
        Ok(warnings) => warnings,
        Err(e) => {
            println!("❌ {}", e);
            bail!("{} is invalid", path.display());
        }
    };
    for w in &warnings {
        println!("⚠️  {}", w);
    }

    println!(
        "✓ {} is valid ({} warning(s))",
        path.display(),
        unknown.len() + warnings.len()
    );
    Ok(())
}

/// Cancel the run once `signal` fires; a listener that fails to install
/// leaves the run alone
async fn cancel_on_signal<F>(signal: F, token: CancellationToken)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            warn!("🛑 Received Ctrl+C, stopping...");
            token.cancel();
        }
        Err(e) => warn!("Cannot listen for Ctrl+C, graceful shutdown disabled: {}", e),
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    init_logging(args.log_format);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(cancel_on_signal(tokio::signal::ctrl_c(), shutdown_token));

    match &args.command {
        Some(SubCommand::Render { results, output_dir, config }) => {
            render(results, output_dir.as_deref(), config.as_deref())
        }
        Some(SubCommand::CheckConfig { path }) => check_config(path.as_deref()),
        Some(SubCommand::Run(run_args)) => run(run_args, cancel_token).await,
        None => run(&args.run, cancel_token).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signal_cancels_the_run() {
        let token = CancellationToken::new();
        cancel_on_signal(async { Ok(()) }, token.clone()).await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn failed_signal_listener_leaves_the_run_alone() {
        let token = CancellationToken::new();
        let failing = async { Err(std::io::Error::new(std::io::ErrorKind::Other, "no signal support")) };
        cancel_on_signal(failing, token.clone()).await;
        assert!(!token.is_cancelled());
    }

    #[test]
    fn explicit_config_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.toml");
        std::fs::write(&path, "[thresholds]\nsuccess_reference_percent = 70.0\n").unwrap();

        let cfg = load_base_config(Some(&path)).unwrap();
        assert_eq!(cfg.thresholds.success_reference_percent, 70.0);

        let missing = load_base_config(Some(&dir.path().join("absent.toml")));
        assert!(missing.is_err());
    }
}
