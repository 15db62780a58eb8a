//! Shared test fixtures for monitor_core and downstream crates.
//!
//! `base_config()` is the debounce-2 configuration most behaviour tests use.
//! `run_schedule()` drives a fresh machine over per-tick anomaly lists the way
//! the simulation driver does, minus the boot and fault-injection records.

use crate::{AlarmMachine, Anomaly, AnomalyKind, EventCode, EventLog, MonitorConfig, TickEvents};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn base_config() -> MonitorConfig {
    MonitorConfig {
        tick_ms: 10,
        total_ticks: 50,
        spike_threshold: 1000,
        raise_after: 2,
        clear_after: 2,
    }
}

pub fn spike(value: i64) -> Anomaly {
    Anomaly::new(0, AnomalyKind::SensorSpike, value)
}

pub fn dropout() -> Anomaly {
    Anomaly::new(0, AnomalyKind::Dropout, 1)
}

pub fn codes(events: &TickEvents) -> Vec<EventCode> {
    events.iter().map(|e| e.code).collect()
}

pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

/// One tick's anomalies drawn from a mix of nothing, spikes, sub-threshold
/// values, dropouts and unknown kinds.
pub fn random_tick(rng: &mut impl Rng) -> Vec<Anomaly> {
    let count = rng.gen_range(0..=2);
    (0..count)
        .map(|_| match rng.gen_range(0..10) {
            0 => dropout(),
            1 => Anomaly::new(0, "stuck_at", rng.gen_range(0..2000)),
            2..=5 => spike(rng.gen_range(1000..1600)),
            _ => spike(rng.gen_range(0..1000)),
        })
        .collect()
}

pub fn run_schedule(config: &MonitorConfig, schedule: &[Vec<Anomaly>]) -> EventLog {
    let mut machine = AlarmMachine::new(config.clone());
    let mut log = EventLog::new();
    for (i, anomalies) in schedule.iter().enumerate() {
        let now_ms = i as u64 * config.tick_ms;
        log.extend(machine.tick(now_ms, anomalies));
    }
    log
}
