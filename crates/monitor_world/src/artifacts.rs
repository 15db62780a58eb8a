//! Files written alongside a run: the event stream, derived metrics and run
//! metadata. Nothing here feeds back into the simulation.

use anyhow::{Context, Result};
use monitor_core::{metrics::METRICS_VERSION, EventLog, MonitorConfig, RunMetrics};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Create `<base>/<name>_<UTC timestamp>` and return it.
pub fn create_run_dir(base: &Path, name: &str) -> Result<PathBuf> {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let dir = base.join(format!("{name}_{timestamp}"));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating run directory: {}", dir.display()))?;
    Ok(dir)
}

/// One JSON object per line, in log order.
pub fn write_events_jsonl(path: &Path, log: &EventLog) -> Result<()> {
    let file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = std::io::BufWriter::new(file);
    for event in log {
        serde_json::to_writer(&mut writer, event)
            .with_context(|| format!("writing {}", path.display()))?;
        writer.write_all(b"\n")?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

pub fn write_metrics_json(path: &Path, metrics: &RunMetrics) -> Result<()> {
    let json = serde_json::json!({
        "metrics_version": METRICS_VERSION,
        "metrics": metrics,
        "mean_time_to_clear_ms": metrics.mean_time_to_clear_ms(),
    });
    let file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, &json)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn write_run_info(
    dir: &Path,
    run_id: &str,
    scenario_name: &str,
    config: &MonitorConfig,
    args: serde_json::Value,
) -> Result<()> {
    let info = serde_json::json!({
        "run_id": run_id,
        "scenario": scenario_name,
        "start_time": chrono::Utc::now().to_rfc3339(),
        "config": config,
        "args": args,
    });
    let path = dir.join("run_info.json");
    let file =
        std::fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, &info)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
