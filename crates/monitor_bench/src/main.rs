use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod batch;
mod run_result;
mod runner;
mod summary;

#[derive(Parser)]
#[command(
    name = "monitor_bench",
    about = "Seed sweeps with replay determinism checks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch file across its seeds.
    Run {
        /// Path to the batch JSON file.
        #[arg(long)]
        batch: PathBuf,
        /// Output directory (default: runs/).
        #[arg(long, default_value = "runs")]
        output_dir: PathBuf,
    },
}

fn run(batch_path: &Path, output_dir: &Path) -> Result<PathBuf> {
    let batch = batch::load_batch(batch_path)?;
    let base_config = batch.base_config()?;
    let seeds = batch.seeds.expand();
    let batch_params = batch.params();

    println!(
        "Loading batch '{}': {} seeds × {} ticks, {} replays each",
        batch.name,
        seeds.len(),
        batch.ticks,
        batch.replays
    );

    let run_dir = monitor_world::create_run_dir(output_dir, &batch.name)?;
    std::fs::copy(batch_path, run_dir.join("batch.json")).context("copying batch file")?;

    println!("Output: {}", run_dir.display());
    println!("Running {} seeds in parallel...", seeds.len());

    let results: Vec<Result<runner::SeedResult>> = seeds
        .par_iter()
        .map(|&seed| {
            let seed_dir = run_dir.join(format!("seed_{seed}"));
            runner::run_seed(&batch, &base_config, seed, &seed_dir, &batch_params)
        })
        .collect();

    let mut seed_results = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(seed_result) => seed_results.push(seed_result),
            Err(err) => {
                eprintln!("Seed failed: {err:#}");
                failures.push(format!("{err:#}"));
            }
        }
    }

    if seed_results.is_empty() {
        anyhow::bail!("all seeds failed");
    }

    let metrics: Vec<&monitor_core::RunMetrics> =
        seed_results.iter().map(|r| &r.metrics).collect();
    let stats = summary::compute_summary(&metrics, failures.len());
    summary::print_summary(&batch.name, batch.ticks, &stats);

    let summary_path = run_dir.join("summary.json");
    let summary_json = serde_json::to_string_pretty(&stats).context("serializing summary")?;
    std::fs::write(&summary_path, summary_json)
        .with_context(|| format!("writing {}", summary_path.display()))?;

    let batch_summary = serde_json::json!({
        "batch_schema_version": 1,
        "batch_id": Uuid::new_v4().to_string(),
        "batch_name": batch.name,
        "batch_params": batch_params,
        "git_sha": run_result::git_sha(),
        "git_dirty": run_result::git_dirty(),
        "seed_count": seed_results.len(),
        "seeds": seed_results.iter().map(|r| r.seed).collect::<Vec<_>>(),
        "run_ids": seed_results.iter().map(|r| r.run_id.as_str()).collect::<Vec<_>>(),
        "failed_count": failures.len(),
        "failures": failures,
        "aggregated_metrics": summary::build_aggregated_metrics(&stats),
    });

    let batch_summary_path = run_dir.join("batch_summary.json");
    let batch_tmp = batch_summary_path.with_extension("json.tmp");
    let batch_json =
        serde_json::to_string_pretty(&batch_summary).context("serializing batch summary")?;
    let mut batch_file = std::fs::File::create(&batch_tmp)
        .with_context(|| format!("creating {}", batch_tmp.display()))?;
    batch_file
        .write_all(batch_json.as_bytes())
        .context("writing batch summary")?;
    batch_file.sync_all()?;
    std::fs::rename(&batch_tmp, &batch_summary_path).context("renaming batch summary")?;

    tracing::info!(
        batch = %batch.name,
        completed = seed_results.len(),
        failed = failures.len(),
        "batch complete"
    );
    println!("Summary written to {}", summary_path.display());
    println!(
        "Batch summary written to {}",
        batch_summary_path.display()
    );
    Ok(run_dir)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { batch, output_dir } => {
            run(&batch, &output_dir)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_writes_batch_outputs() {
        let out = tempfile::TempDir::new().unwrap();
        let batch_file = out.path().join("small.json");
        std::fs::write(
            &batch_file,
            r#"{"name": "small", "ticks": 120, "seeds": {"range": [1, 3]}, "replays": 2}"#,
        )
        .unwrap();

        let run_dir = run(&batch_file, &out.path().join("runs")).unwrap();

        assert!(run_dir.join("batch.json").exists());
        assert!(run_dir.join("summary.json").exists());
        for seed in 1..=3 {
            let seed_dir = run_dir.join(format!("seed_{seed}"));
            assert!(seed_dir.join("events.csv").exists());
            assert!(seed_dir.join("run_result.json").exists());
        }

        let batch_summary: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(run_dir.join("batch_summary.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(batch_summary["seed_count"], 3);
        assert_eq!(batch_summary["failed_count"], 0);
        assert!(!batch_summary["batch_id"].as_str().unwrap().is_empty());
        assert!(batch_summary["aggregated_metrics"]["alarms_raised"].is_object());
        assert!(!run_dir.join("batch_summary.json.tmp").exists());
    }

    #[test]
    fn test_run_rejects_invalid_batch() {
        let out = tempfile::TempDir::new().unwrap();
        let batch_file = out.path().join("bad.json");
        std::fs::write(&batch_file, r#"{"name": "bad", "ticks": 0, "seeds": [1]}"#).unwrap();
        assert!(run(&batch_file, out.path()).is_err());
    }
}
