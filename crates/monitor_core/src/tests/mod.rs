use super::*;
use crate::test_fixtures::{base_config, codes, dropout, spike};


// --- Shared test helpers ------------------------------------------------

fn test_machine() -> AlarmMachine {
    AlarmMachine::new(base_config())
}

/// Two consecutive spikes with the base config commit the raise.
fn raised_machine() -> AlarmMachine {
    let mut machine = test_machine();
    machine.tick(0, &[spike(1200)]);
    let events = machine.tick(10, &[spike(1200)]);
    assert!(codes(&events).contains(&EventCode::AlarmRaised));
    assert_eq!(machine.state(), AlarmState::Alarmed);
    machine
}

fn transition_detail(events: &TickEvents) -> Option<&str> {
    events
        .iter()
        .find(|e| e.code == EventCode::StateTransition)
        .map(|e| e.detail.as_str())
}

#[test]
fn app_tick_is_always_first() {
    let mut machine = test_machine();
    let schedules = [vec![], vec![spike(1200)], vec![dropout()]];
    for (i, anomalies) in schedules.iter().enumerate() {
        let events = machine.tick(i as u64 * 10, anomalies);
        assert_eq!(events[0].code, EventCode::AppTick);
        assert_eq!(events[0].detail, format!("tick={i}"));
    }
}

#[test]
fn tick_counter_advances_once_per_call() {
    let mut machine = test_machine();
    machine.tick(0, &[]);
    machine.tick(10, &[dropout()]);
    machine.tick(20, &[dropout()]);
    machine.tick(30, &[spike(5000)]);
    assert_eq!(machine.tick_count(), 4);
}

#[test]
fn step_accepts_resolved_readings() {
    let mut machine = test_machine();
    let events = machine.step(0, Reading::Absent);
    assert!(codes(&events).contains(&EventCode::AlarmRaised));
    let events = machine.step(10, Reading::Present(999));
    assert!(codes(&events).contains(&EventCode::AlarmPendingClear));
}

#[test]
fn events_carry_the_given_time() {
    let mut machine = test_machine();
    let events = machine.tick(1230, &[dropout()]);
    assert!(events.iter().all(|e| e.t_ms == 1230));
}

#[test]
#[should_panic(expected = "debounce counts out of range")]
fn zero_raise_debounce_is_rejected() {
    let mut config = base_config();
    config.raise_after = 0;
    let _ = AlarmMachine::new(config);
}

#[test]
#[should_panic(expected = "clear_after=1 (min 2)")]
fn single_tick_clear_is_rejected() {
    let mut config = base_config();
    config.clear_after = 1;
    let _ = AlarmMachine::new(config);
}
