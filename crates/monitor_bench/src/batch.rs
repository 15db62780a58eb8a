use anyhow::{bail, Context, Result};
use monitor_core::MonitorConfig;
use monitor_world::{apply_overrides, validate_config, FaultProfile};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// A seed sweep: one generated fault schedule per seed, each replayed
/// `replays` times.
#[derive(Debug, Deserialize)]
pub struct Batch {
    pub name: String,
    pub ticks: u64,
    #[serde(default)]
    pub tick_ms: Option<u64>,
    pub seeds: SeedSpec,
    #[serde(default)]
    pub profile: FaultProfile,
    #[serde(default = "default_replays")]
    pub replays: u32,
    #[serde(default)]
    pub overrides: BTreeMap<String, serde_json::Value>,
}

fn default_replays() -> u32 {
    2
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SeedSpec {
    List(Vec<u64>),
    Range { range: [u64; 2] },
}

impl SeedSpec {
    pub fn expand(&self) -> Vec<u64> {
        match self {
            SeedSpec::List(seeds) => seeds.clone(),
            SeedSpec::Range { range } => (range[0]..=range[1]).collect(),
        }
    }
}

impl Batch {
    /// Config shared by every seed: defaults, then `tick_ms`, then overrides.
    /// `ticks` always wins over an overridden `total_ticks`.
    pub fn base_config(&self) -> Result<MonitorConfig> {
        let mut config = MonitorConfig::default();
        if let Some(tick_ms) = self.tick_ms {
            config.tick_ms = tick_ms;
        }
        apply_overrides(&mut config, &self.overrides).context("applying batch overrides")?;
        config.total_ticks = self.ticks;
        validate_config(&config)?;
        Ok(config)
    }

    pub fn params(&self) -> serde_json::Value {
        serde_json::json!({
            "ticks": self.ticks,
            "tick_ms": self.tick_ms,
            "profile": self.profile,
            "replays": self.replays,
            "overrides": self.overrides,
        })
    }
}

pub fn load_batch(path: &Path) -> Result<Batch> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading batch file: {}", path.display()))?;
    let batch: Batch = serde_json::from_str(&json)
        .with_context(|| format!("parsing batch file: {}", path.display()))?;
    if batch.name.trim().is_empty() {
        bail!("batch 'name' must not be empty");
    }
    if batch.ticks == 0 {
        bail!("batch 'ticks' must be > 0");
    }
    if batch.replays == 0 {
        bail!("batch 'replays' must be >= 1");
    }
    if let SeedSpec::Range { range: [start, end] } = batch.seeds {
        if start > end {
            bail!("batch seed range [{start}, {end}] is reversed");
        }
    }
    let seeds = batch.seeds.expand();
    if seeds.is_empty() {
        bail!("batch 'seeds' must produce at least one seed");
    }
    // Each seed owns its output directory.
    let mut seen = BTreeSet::new();
    if let Some(dup) = seeds.iter().find(|&&seed| !seen.insert(seed)) {
        bail!("batch 'seeds' lists seed {dup} more than once");
    }
    batch.profile.validate().context("batch 'profile'")?;
    batch.base_config()?;
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_batch(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_batch_with_seed_list() {
        let file = write_temp_batch(
            r#"{
            "name": "list",
            "ticks": 200,
            "seeds": [1, 2, 3]
        }"#,
        );
        let batch = load_batch(file.path()).unwrap();
        assert_eq!(batch.name, "list");
        assert_eq!(batch.seeds.expand(), vec![1, 2, 3]);
        assert_eq!(batch.replays, 2);
        assert_eq!(batch.profile, FaultProfile::default());
        assert!(batch.overrides.is_empty());
    }

    #[test]
    fn test_load_batch_with_seed_range() {
        let file = write_temp_batch(
            r#"{
            "name": "range",
            "ticks": 50,
            "seeds": {"range": [4, 7]}
        }"#,
        );
        let batch = load_batch(file.path()).unwrap();
        assert_eq!(batch.seeds.expand(), vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_base_config_layers_tick_ms_and_overrides() {
        let file = write_temp_batch(
            r#"{
            "name": "tuned",
            "ticks": 80,
            "tick_ms": 25,
            "seeds": [1],
            "overrides": {"raise_after": 4, "total_ticks": 10}
        }"#,
        );
        let config = load_batch(file.path()).unwrap().base_config().unwrap();
        assert_eq!(config.tick_ms, 25);
        assert_eq!(config.raise_after, 4);
        assert_eq!(config.total_ticks, 80);
    }

    #[test]
    fn test_partial_profile_keeps_defaults() {
        let file = write_temp_batch(
            r#"{
            "name": "calm",
            "ticks": 10,
            "seeds": [1],
            "profile": {"spike_rate": 0.01}
        }"#,
        );
        let batch = load_batch(file.path()).unwrap();
        assert!((batch.profile.spike_rate - 0.01).abs() < 1e-12);
        assert_eq!(batch.profile.burst_max, FaultProfile::default().burst_max);
    }

    #[test]
    fn test_invalid_batches_fail() {
        for json in [
            r#"{"name": "", "ticks": 10, "seeds": [1]}"#,
            r#"{"name": "a", "ticks": 0, "seeds": [1]}"#,
            r#"{"name": "a", "ticks": 10, "seeds": []}"#,
            r#"{"name": "a", "ticks": 10, "seeds": {"range": [5, 1]}}"#,
            r#"{"name": "a", "ticks": 10, "seeds": [1], "replays": 0}"#,
            r#"{"name": "a", "ticks": 10, "seeds": [1], "overrides": {"bogus": 1}}"#,
            r#"{"name": "a", "ticks": 10, "seeds": [1], "overrides": {"clear_after": 0}}"#,
            r#"{"name": "a", "ticks": 10, "seeds": [1], "profile": {"dropout_rate": 2.0}}"#,
            r#"{"name": "a", "ticks": 10, "seeds": [1], "tick_ms": 18446744073709551615}"#,
        ] {
            let file = write_temp_batch(json);
            assert!(load_batch(file.path()).is_err(), "expected failure: {json}");
        }
    }

    #[test]
    fn test_duplicate_seeds_rejected() {
        let file = write_temp_batch(r#"{"name": "dup", "ticks": 10, "seeds": [5, 3, 5]}"#);
        let err = load_batch(file.path()).unwrap_err().to_string();
        assert!(err.contains("seed 5"), "{err}");
    }

    #[test]
    fn test_checked_in_batch_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../batches/noisy_sensor.json");
        let batch = load_batch(&path).unwrap();
        assert_eq!(batch.name, "noisy_sensor");
        assert_eq!(batch.seeds.expand().len(), 8);
    }
}
