//! Replay determinism: the same anomaly schedule through a fresh machine must
//! produce an identical event log, and metrics derived from it must agree.

use monitor_core::test_fixtures::{base_config, dropout, make_rng, random_tick, run_schedule, spike};
use monitor_core::*;

fn mixed_schedule() -> Vec<Vec<Anomaly>> {
    vec![
        vec![],
        vec![spike(1200)],
        vec![spike(1250)],
        vec![],
        vec![spike(1300)],
        vec![],
        vec![],
        vec![dropout(), spike(1400)],
        vec![dropout()],
        vec![],
        vec![],
    ]
}

#[test]
fn same_schedule_renders_identically() {
    let config = base_config();
    let first = run_schedule(&config, &mixed_schedule());
    let second = run_schedule(&config, &mixed_schedule());
    assert_eq!(first, second);
    assert_eq!(first.render(), second.render());
}

#[test]
fn random_schedules_replay_identically() {
    let mut rng = make_rng();
    let schedule: Vec<Vec<Anomaly>> = (0..1000).map(|_| random_tick(&mut rng)).collect();
    let config = base_config();
    assert_eq!(
        run_schedule(&config, &schedule).render(),
        run_schedule(&config, &schedule).render()
    );
}

#[test]
fn mixed_schedule_produces_expected_sequence() {
    let log = run_schedule(&base_config(), &mixed_schedule());
    let terminal: Vec<(u64, EventCode)> = log
        .iter()
        .filter(|e| {
            matches!(
                e.code,
                EventCode::AlarmRaised | EventCode::AlarmCleared | EventCode::AlarmPendingClear
            )
        })
        .map(|e| (e.t_ms, e.code))
        .collect();

    assert_eq!(
        terminal,
        vec![
            (20, EventCode::AlarmRaised),
            (30, EventCode::AlarmPendingClear),
            // tick 4 restarts the raise debounce, tick 5 drops it again
            (70, EventCode::AlarmRaised),
            (90, EventCode::AlarmPendingClear),
            (100, EventCode::AlarmCleared),
        ]
    );
}

#[test]
fn metrics_from_replayed_log() {
    let config = base_config();
    let log = run_schedule(&config, &mixed_schedule());
    let metrics = compute_metrics(&log, config.tick_ms);

    assert_eq!(metrics.alarms_raised, 2);
    assert_eq!(metrics.alarms_cleared, 1);
    // First window opens at 20ms and is never cleared before the second
    // raise, so the only sample spans 20ms..100ms.
    assert_eq!(metrics.clear_durations_count, 1);
    assert_eq!(metrics.clear_durations_ms_total, 80);
    assert_eq!(metrics.alarmed_ms + metrics.nominal_ms, 110);
    assert_eq!(metrics.alarmed_ms, 80);
    // No FAULT_INJECTED records without a driver.
    assert_eq!(metrics.faults_injected, 0);
}
