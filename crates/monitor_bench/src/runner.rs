use crate::batch::Batch;
use crate::run_result::{self, RunResult, RunStatus, RUN_SCHEMA_VERSION};
use anyhow::{bail, Context, Result};
use monitor_core::metrics::METRICS_VERSION;
use monitor_core::{compute_metrics, EventLog, FaultFeed, MonitorConfig, RunMetrics};
use monitor_world::{generate_scenario, run_monitor, ScenarioFeed};
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

pub struct SeedResult {
    pub seed: u64,
    pub metrics: RunMetrics,
    pub run_id: String,
}

pub fn run_seed(
    batch: &Batch,
    base_config: &MonitorConfig,
    seed: u64,
    seed_dir: &Path,
    batch_params: &serde_json::Value,
) -> Result<SeedResult> {
    let run_id = Uuid::new_v4().to_string();
    let start = Instant::now();

    std::fs::create_dir_all(seed_dir)
        .with_context(|| format!("creating seed directory: {}", seed_dir.display()))?;

    let scenario = generate_scenario(seed, batch.ticks, &batch.profile)
        .with_context(|| format!("generating schedule for seed {seed}"))?;
    let config = scenario.resolve_config(base_config.clone())?;
    let feed = ScenarioFeed::new(&scenario);

    let mut result = RunResult {
        run_schema_version: RUN_SCHEMA_VERSION,
        metrics_version: METRICS_VERSION,
        run_status: RunStatus::Completed,
        run_id: run_id.clone(),
        git_sha: run_result::git_sha(),
        git_dirty: run_result::git_dirty(),
        seed,
        batch_name: batch.name.clone(),
        batch_params: batch_params.clone(),
        total_ticks: config.total_ticks,
        tick_ms: config.tick_ms,
        replays: batch.replays,
        wall_time_ms: 0,
        event_count: 0,
        fault_count: scenario.faults.len(),
        metrics: None,
        mean_time_to_clear_ms: None,
        events_path: None,
        error_message: None,
    };
    let result_path = seed_dir.join("run_result.json");

    let log = match replay_checked(&config, &feed, batch.replays) {
        Ok(log) => log,
        Err(err) => {
            tracing::error!(seed, error = %err, "replays diverged");
            result.run_status = RunStatus::Nondeterministic;
            result.error_message = Some(err.to_string());
            result.wall_time_ms = elapsed_ms(start);
            result
                .write_atomic(&result_path)
                .context("writing run_result.json")?;
            return Err(err.context(format!("seed {seed}")));
        }
    };

    let metrics = compute_metrics(&log, config.tick_ms);
    write_events_csv(&seed_dir.join("events.csv"), &log)?;

    result.wall_time_ms = elapsed_ms(start);
    result.event_count = log.len();
    result.mean_time_to_clear_ms = metrics.mean_time_to_clear_ms();
    result.metrics = Some(metrics.clone());
    result.events_path = Some("events.csv".to_string());
    result
        .write_atomic(&result_path)
        .context("writing run_result.json")?;

    tracing::debug!(
        seed,
        events = log.len(),
        alarms_raised = metrics.alarms_raised,
        "seed complete"
    );
    Ok(SeedResult {
        seed,
        metrics,
        run_id,
    })
}

/// Run the same schedule `replays` times and require identical rendered logs.
pub fn replay_checked<F>(config: &MonitorConfig, feed: &F, replays: u32) -> Result<EventLog>
where
    F: FaultFeed + ?Sized,
{
    let first = run_monitor(config, feed);
    let expected = first.render();
    for replay in 1..replays {
        let actual = run_monitor(config, feed).render();
        if actual != expected {
            bail!(
                "determinism violation: replay {replay} diverged from replay 0 at line {}",
                first_divergence(&expected, &actual)
            );
        }
    }
    Ok(first)
}

/// 1-based line number of the first difference between two renderings.
fn first_divergence(expected: &str, actual: &str) -> usize {
    let mut expected_lines = expected.lines();
    let mut actual_lines = actual.lines();
    let mut line = 1;
    loop {
        match (expected_lines.next(), actual_lines.next()) {
            (Some(a), Some(b)) if a == b => line += 1,
            _ => return line,
        }
    }
}

fn write_events_csv(path: &Path, log: &EventLog) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["t_ms", "level", "code", "detail"])?;
    for event in log {
        let t_ms = event.t_ms.to_string();
        writer.write_record([
            t_ms.as_str(),
            event.level.as_str(),
            event.code.as_str(),
            event.detail.as_str(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
