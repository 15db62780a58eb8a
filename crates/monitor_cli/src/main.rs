use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use monitor_core::{compute_metrics, EventLog, MonitorConfig, RunMetrics};
use monitor_world::{
    apply_overrides, create_run_dir, generate_scenario, load_scenario, run_monitor,
    validate_config, write_events_jsonl, write_metrics_json, write_run_info, FaultProfile,
    ScenarioFeed,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "monitor_cli", about = "Debounced sensor alarm monitor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario and print its event log and metrics.
    Run(RunArgs),
    /// Write a randomly generated scenario document.
    Generate(GenerateArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Path to the scenario JSON file.
    #[arg(long, default_value = "scenarios/demo.json")]
    scenario: PathBuf,
    #[arg(long)]
    tick_ms: Option<u64>,
    #[arg(long)]
    ticks: Option<u64>,
    /// Spike threshold (inclusive).
    #[arg(long)]
    threshold: Option<i64>,
    #[arg(long)]
    raise_after: Option<u32>,
    #[arg(long)]
    clear_after: Option<u32>,
    /// Also write events.jsonl, metrics.json and run_info.json under this directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Print only the metrics block.
    #[arg(long)]
    quiet: bool,
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(long)]
    seed: u64,
    #[arg(long)]
    ticks: u64,
    #[arg(long)]
    spike_rate: Option<f64>,
    #[arg(long)]
    dropout_rate: Option<f64>,
    #[arg(long)]
    spike_min: Option<i64>,
    #[arg(long)]
    spike_max: Option<i64>,
    #[arg(long)]
    burst_max: Option<u64>,
    /// Destination for the scenario document.
    #[arg(long)]
    out: PathBuf,
}

// ---------------------------------------------------------------------------
// Config layering
// ---------------------------------------------------------------------------

/// Defaults, then the scenario's own config, then command-line flags.
fn resolve_config(
    args: &RunArgs,
    scenario_config: &std::collections::BTreeMap<String, serde_json::Value>,
) -> Result<MonitorConfig> {
    let mut config = MonitorConfig::default();
    apply_overrides(&mut config, scenario_config).context("applying scenario config")?;

    if let Some(tick_ms) = args.tick_ms {
        config.tick_ms = tick_ms;
    }
    if let Some(ticks) = args.ticks {
        config.total_ticks = ticks;
    }
    if let Some(threshold) = args.threshold {
        config.spike_threshold = threshold;
    }
    if let Some(raise_after) = args.raise_after {
        config.raise_after = raise_after;
    }
    if let Some(clear_after) = args.clear_after {
        config.clear_after = clear_after;
    }

    validate_config(&config)?;
    Ok(config)
}

fn profile_from_args(args: &GenerateArgs) -> FaultProfile {
    let defaults = FaultProfile::default();
    FaultProfile {
        spike_rate: args.spike_rate.unwrap_or(defaults.spike_rate),
        dropout_rate: args.dropout_rate.unwrap_or(defaults.dropout_rate),
        spike_min: args.spike_min.unwrap_or(defaults.spike_min),
        spike_max: args.spike_max.unwrap_or(defaults.spike_max),
        burst_max: args.burst_max.unwrap_or(defaults.burst_max),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run(args: &RunArgs) -> Result<()> {
    let scenario = load_scenario(&args.scenario)?;
    let config = resolve_config(args, &scenario.config)
        .with_context(|| format!("configuring scenario '{}'", scenario.name))?;

    tracing::info!(
        scenario = %scenario.name,
        ticks = config.total_ticks,
        tick_ms = config.tick_ms,
        "starting run"
    );
    let feed = ScenarioFeed::new(&scenario);
    if let Some(last) = feed.last_tick().filter(|&t| t >= config.total_ticks) {
        tracing::warn!(
            last_fault_tick = last,
            total_ticks = config.total_ticks,
            "faults scheduled past the last tick will not be injected"
        );
    }
    let log = run_monitor(&config, &feed);
    let metrics = compute_metrics(&log, config.tick_ms);

    if !args.quiet {
        print!("{}", log.render());
    }
    print_metrics(&metrics);

    if let Some(ref out_dir) = args.out_dir {
        let run_dir = write_artifacts(out_dir, &scenario.name, &config, &log, &metrics, args)?;
        println!("Run directory: {}", run_dir.display());
    }
    Ok(())
}

fn write_artifacts(
    out_dir: &Path,
    scenario_name: &str,
    config: &MonitorConfig,
    log: &EventLog,
    metrics: &RunMetrics,
    args: &RunArgs,
) -> Result<PathBuf> {
    let run_dir = create_run_dir(out_dir, scenario_name)?;
    let run_id = uuid::Uuid::new_v4().to_string();
    write_run_info(
        &run_dir,
        &run_id,
        scenario_name,
        config,
        serde_json::json!({
            "runner": "monitor_cli",
            "scenario_path": args.scenario.display().to_string(),
            "quiet": args.quiet,
        }),
    )?;
    write_events_jsonl(&run_dir.join("events.jsonl"), log)?;
    write_metrics_json(&run_dir.join("metrics.json"), metrics)?;
    tracing::info!(run_id = %run_id, dir = %run_dir.display(), "artifacts written");
    Ok(run_dir)
}

fn generate(args: &GenerateArgs) -> Result<()> {
    let profile = profile_from_args(args);
    let scenario = generate_scenario(args.seed, args.ticks, &profile)?;
    let json = serde_json::to_string_pretty(&scenario).context("serializing scenario")?;
    std::fs::write(&args.out, json)
        .with_context(|| format!("writing {}", args.out.display()))?;
    println!(
        "Wrote scenario '{}' ({} faults over {} ticks) to {}",
        scenario.name,
        scenario.faults.len(),
        args.ticks,
        args.out.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn format_metrics(metrics: &RunMetrics) -> String {
    let mean = metrics
        .mean_time_to_clear_ms()
        // Shortest round-trip form, same digits as metrics.json.
        .map_or_else(|| "n/a".to_string(), |mean| format!("{mean:?}"));
    format!(
        "---- METRICS ----\n\
         alarms_raised={}\n\
         alarms_cleared={}\n\
         faults_injected={} dropout={} spikes={}\n\
         time_nominal_ms={} time_alarmed_ms={}\n\
         mean_time_to_clear_ms={mean}\n",
        metrics.alarms_raised,
        metrics.alarms_cleared,
        metrics.faults_injected,
        metrics.dropout_faults,
        metrics.spike_faults,
        metrics.nominal_ms,
        metrics.alarmed_ms,
    )
}

fn print_metrics(metrics: &RunMetrics) {
    print!("{}", format_metrics(metrics));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(&args)?,
        Commands::Generate(args) => generate(&args)?,
    }
    Ok(())
}
