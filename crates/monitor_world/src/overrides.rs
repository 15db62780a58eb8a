use anyhow::{bail, Result};
use monitor_core::MonitorConfig;
use std::collections::BTreeMap;

const VALID_KEYS: &[&str] = &[
    "tick_ms",
    "total_ticks",
    "spike_threshold",
    "raise_after",
    "clear_after",
];

pub fn apply_overrides(
    config: &mut MonitorConfig,
    overrides: &BTreeMap<String, serde_json::Value>,
) -> Result<()> {
    for (key, value) in overrides {
        match key.as_str() {
            "tick_ms" => config.tick_ms = as_u64(key, value)?,
            "total_ticks" => config.total_ticks = as_u64(key, value)?,
            "spike_threshold" => config.spike_threshold = as_i64(key, value)?,
            "raise_after" => config.raise_after = as_u32(key, value)?,
            "clear_after" => config.clear_after = as_u32(key, value)?,
            _ => bail!(
                "unknown override key '{key}'. Valid keys: {}",
                VALID_KEYS.join(", ")
            ),
        }
    }
    Ok(())
}

/// Reject configurations the alarm machine would refuse to run.
pub fn validate_config(config: &MonitorConfig) -> Result<()> {
    if config.raise_after == 0 {
        bail!("'raise_after' must be >= 1");
    }
    if config.clear_after < 2 {
        bail!(
            "'clear_after' must be >= 2 (an alarm clears through PENDING_CLEAR), got {}",
            config.clear_after
        );
    }
    // Every tick's time, and SHUTDOWN's, must fit in a u64.
    if config.tick_ms.checked_mul(config.total_ticks).is_none() {
        bail!(
            "'tick_ms' ({}) x 'total_ticks' ({}) overflows the simulated clock",
            config.tick_ms,
            config.total_ticks
        );
    }
    Ok(())
}

fn as_i64(key: &str, value: &serde_json::Value) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| anyhow::anyhow!("override '{key}': expected an integer, got {value}"))
}

fn as_u64(key: &str, value: &serde_json::Value) -> Result<u64> {
    value.as_u64().ok_or_else(|| {
        anyhow::anyhow!("override '{key}': expected a non-negative integer, got {value}")
    })
}

fn as_u32(key: &str, value: &serde_json::Value) -> Result<u32> {
    let val = as_u64(key, value)?;
    u32::try_from(val)
        .map_err(|_| anyhow::anyhow!("override '{key}': value {val} exceeds u32 range"))
}
