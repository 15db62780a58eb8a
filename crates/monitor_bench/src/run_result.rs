use monitor_core::RunMetrics;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub const RUN_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// Replays of the same seed produced different logs.
    Nondeterministic,
}

/// Per-seed record written to `run_result.json`.
#[derive(Debug, Serialize)]
pub struct RunResult {
    pub run_schema_version: u32,
    pub metrics_version: u32,
    pub run_status: RunStatus,
    pub run_id: String,
    pub git_sha: String,
    pub git_dirty: bool,
    pub seed: u64,
    pub batch_name: String,
    pub batch_params: serde_json::Value,
    pub total_ticks: u64,
    pub tick_ms: u64,
    pub replays: u32,
    pub wall_time_ms: u64,
    pub event_count: usize,
    pub fault_count: usize,
    pub metrics: Option<RunMetrics>,
    pub mean_time_to_clear_ms: Option<f64>,
    pub events_path: Option<String>,
    pub error_message: Option<String>,
}

impl RunResult {
    /// Write JSON atomically: write to `.tmp` then rename.
    pub fn write_atomic(&self, path: &Path) -> anyhow::Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

pub fn git_sha() -> String {
    env!("MONITOR_GIT_SHA").to_string()
}

pub fn git_dirty() -> bool {
    env!("MONITOR_GIT_DIRTY") == "true"
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::metrics::METRICS_VERSION;

    fn sample_result(status: RunStatus, metrics: Option<RunMetrics>) -> RunResult {
        let mean_time_to_clear_ms = metrics.as_ref().and_then(RunMetrics::mean_time_to_clear_ms);
        RunResult {
            run_schema_version: RUN_SCHEMA_VERSION,
            metrics_version: METRICS_VERSION,
            run_status: status,
            run_id: "test-uuid".to_string(),
            git_sha: "abc123".to_string(),
            git_dirty: false,
            seed: 42,
            batch_name: "test_batch".to_string(),
            batch_params: serde_json::json!({"ticks": 100}),
            total_ticks: 100,
            tick_ms: 10,
            replays: 2,
            wall_time_ms: 3,
            event_count: 120,
            fault_count: 8,
            metrics,
            mean_time_to_clear_ms,
            events_path: Some("events.csv".to_string()),
            error_message: None,
        }
    }

    #[test]
    fn test_run_result_serialization() {
        let metrics = RunMetrics {
            alarms_raised: 2,
            alarms_cleared: 2,
            clear_durations_ms_total: 50,
            clear_durations_count: 2,
            ..RunMetrics::default()
        };
        let result = sample_result(RunStatus::Completed, Some(metrics));
        let parsed: serde_json::Value =
            serde_json::from_str(&serde_json::to_string_pretty(&result).unwrap()).unwrap();
        assert_eq!(parsed["run_schema_version"], 1);
        assert_eq!(parsed["run_status"], "completed");
        assert_eq!(parsed["seed"], 42);
        assert_eq!(parsed["metrics"]["alarms_raised"], 2);
        assert!((parsed["mean_time_to_clear_ms"].as_f64().unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_nondeterministic_result_has_no_metrics() {
        let mut result = sample_result(RunStatus::Nondeterministic, None);
        result.error_message = Some("replay 1 diverged".to_string());
        let parsed = serde_json::to_value(&result).unwrap();
        assert_eq!(parsed["run_status"], "nondeterministic");
        assert!(parsed["metrics"].is_null());
        assert!(parsed["mean_time_to_clear_ms"].is_null());
    }

    #[test]
    fn test_atomic_write() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("run_result.json");
        sample_result(RunStatus::Completed, Some(RunMetrics::default()))
            .write_atomic(&path)
            .unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_git_sha_not_empty() {
        assert!(!git_sha().is_empty());
    }
}
