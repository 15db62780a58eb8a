use anyhow::{bail, Context, Result};
use monitor_core::{Anomaly, AnomalyKind, MonitorConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::overrides::{apply_overrides, validate_config};

/// A named fault schedule plus optional config overrides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub name: String,
    pub faults: Vec<Anomaly>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, serde_json::Value>,
}

impl Scenario {
    /// Apply this scenario's overrides on top of `base` and validate the result.
    pub fn resolve_config(&self, base: MonitorConfig) -> Result<MonitorConfig> {
        let mut config = base;
        apply_overrides(&mut config, &self.config)
            .with_context(|| format!("scenario '{}' config", self.name))?;
        validate_config(&config)?;
        Ok(config)
    }
}

#[derive(Deserialize)]
struct ScenarioFile {
    name: Option<String>,
    #[serde(default)]
    faults: Vec<FaultEntry>,
    #[serde(default)]
    config: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct FaultEntry {
    tick: i64,
    kind: String,
    value: i64,
}

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario file: {}", path.display()))?;
    let scenario = parse_scenario(&json)
        .with_context(|| format!("parsing scenario file: {}", path.display()))?;
    tracing::debug!(
        name = %scenario.name,
        faults = scenario.faults.len(),
        "loaded scenario from {}",
        path.display()
    );
    Ok(scenario)
}

pub fn parse_scenario(json: &str) -> Result<Scenario> {
    let file: ScenarioFile = serde_json::from_str(json).context("invalid scenario document")?;

    let name = file.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        bail!("scenario 'name' must be a non-empty string");
    }

    let mut faults = Vec::with_capacity(file.faults.len());
    for (index, entry) in file.faults.into_iter().enumerate() {
        let Ok(tick) = u64::try_from(entry.tick) else {
            bail!("fault {index}: 'tick' must be >= 0, got {}", entry.tick);
        };
        let kind = entry.kind.trim();
        if kind.is_empty() {
            bail!("fault {index}: 'kind' must be a non-empty string");
        }
        let kind = AnomalyKind::from(kind);
        if let AnomalyKind::Other(ref unknown) = kind {
            tracing::warn!("fault {index}: unrecognized kind '{unknown}' will not affect readings");
        }
        faults.push(Anomaly {
            tick,
            kind,
            value: entry.value,
        });
    }

    Ok(Scenario {
        name: name.to_string(),
        faults,
        config: file.config,
    })
}
