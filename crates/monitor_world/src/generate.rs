use anyhow::{bail, Result};
use monitor_core::{Anomaly, AnomalyKind};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::Scenario;

/// Shape of a generated fault schedule.
///
/// Each tick not already covered by a burst starts a spike burst with
/// probability `spike_rate`, otherwise a dropout burst with probability
/// `dropout_rate`. Bursts last `1..=burst_max` ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultProfile {
    pub spike_rate: f64,
    pub dropout_rate: f64,
    pub spike_min: i64,
    pub spike_max: i64,
    pub burst_max: u64,
}

impl Default for FaultProfile {
    fn default() -> Self {
        Self {
            spike_rate: 0.08,
            dropout_rate: 0.02,
            spike_min: 1000,
            spike_max: 1500,
            burst_max: 3,
        }
    }
}

impl FaultProfile {
    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("spike_rate", self.spike_rate),
            ("dropout_rate", self.dropout_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                bail!("profile '{name}' must be within [0, 1], got {rate}");
            }
        }
        if self.spike_min > self.spike_max {
            bail!(
                "profile 'spike_min' ({}) must not exceed 'spike_max' ({})",
                self.spike_min,
                self.spike_max
            );
        }
        if self.burst_max == 0 {
            bail!("profile 'burst_max' must be >= 1");
        }
        Ok(())
    }
}

/// Build a deterministic fault schedule for `ticks` ticks from `seed`.
///
/// The returned scenario carries `total_ticks` in its config so a later run
/// covers exactly the generated span.
pub fn generate_scenario(seed: u64, ticks: u64, profile: &FaultProfile) -> Result<Scenario> {
    profile.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut faults = Vec::new();

    let mut tick = 0;
    while tick < ticks {
        let kind = if rng.gen_bool(profile.spike_rate) {
            AnomalyKind::SensorSpike
        } else if rng.gen_bool(profile.dropout_rate) {
            AnomalyKind::Dropout
        } else {
            tick += 1;
            continue;
        };

        let burst = rng.gen_range(1..=profile.burst_max).min(ticks - tick);
        for offset in 0..burst {
            let value = match kind {
                AnomalyKind::SensorSpike => rng.gen_range(profile.spike_min..=profile.spike_max),
                _ => 1,
            };
            faults.push(Anomaly::new(tick + offset, kind.clone(), value));
        }
        tick += burst;
    }

    tracing::debug!(seed, ticks, faults = faults.len(), "generated fault schedule");
    Ok(Scenario {
        name: format!("generated_seed{seed}"),
        faults,
        config: BTreeMap::from([("total_ticks".to_string(), serde_json::Value::from(ticks))]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_schedule() {
        let profile = FaultProfile::default();
        let a = generate_scenario(7, 500, &profile).unwrap();
        let b = generate_scenario(7, 500, &profile).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.name, "generated_seed7");
        assert_eq!(a.config["total_ticks"], 500);
    }

    #[test]
    fn test_different_seeds_differ() {
        let profile = FaultProfile::default();
        let a = generate_scenario(1, 500, &profile).unwrap();
        let b = generate_scenario(2, 500, &profile).unwrap();
        assert_ne!(a.faults, b.faults);
    }

    #[test]
    fn test_faults_stay_in_range() {
        let profile = FaultProfile {
            spike_rate: 0.3,
            dropout_rate: 0.3,
            spike_min: 1100,
            spike_max: 1200,
            burst_max: 4,
        };
        let scenario = generate_scenario(99, 200, &profile).unwrap();
        assert!(!scenario.faults.is_empty());
        let mut last_tick = None;
        for fault in &scenario.faults {
            assert!(fault.tick < 200);
            // At most one fault per tick, in increasing tick order.
            assert!(last_tick.map_or(true, |t| fault.tick > t));
            last_tick = Some(fault.tick);
            if fault.kind == AnomalyKind::SensorSpike {
                assert!((1100..=1200).contains(&fault.value));
            }
        }
    }

    #[test]
    fn test_zero_rates_generate_nothing() {
        let profile = FaultProfile {
            spike_rate: 0.0,
            dropout_rate: 0.0,
            ..FaultProfile::default()
        };
        let scenario = generate_scenario(5, 100, &profile).unwrap();
        assert!(scenario.faults.is_empty());
    }

    #[test]
    fn test_invalid_profiles_rejected() {
        let bad_rate = FaultProfile {
            spike_rate: 1.5,
            ..FaultProfile::default()
        };
        assert!(generate_scenario(1, 10, &bad_rate).is_err());

        let inverted = FaultProfile {
            spike_min: 2000,
            spike_max: 1000,
            ..FaultProfile::default()
        };
        assert!(generate_scenario(1, 10, &inverted).is_err());

        let no_burst = FaultProfile {
            burst_max: 0,
            ..FaultProfile::default()
        };
        assert!(generate_scenario(1, 10, &no_burst).is_err());
    }
}
