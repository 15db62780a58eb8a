use monitor_core::{AlarmMachine, Event, EventCode, EventLog, FaultFeed, MonitorConfig, Severity};

use crate::SimClock;

/// Run one full simulation and return its event log.
///
/// Order of records:
/// 1. `BOOT` at t=0.
/// 2. Per tick: one `FAULT_INJECTED` per scheduled anomaly, then the alarm
///    machine's records for that tick.
/// 3. `SHUTDOWN` at the clock time after the last tick.
///
/// `config` must already have passed `validate_config`; an out-of-range
/// debounce count panics inside the alarm machine.
pub fn run_monitor<F>(config: &MonitorConfig, feed: &F) -> EventLog
where
    F: FaultFeed + ?Sized,
{
    let mut clock = SimClock::new(config.tick_ms);
    let mut machine = AlarmMachine::new(config.clone());
    let mut log = EventLog::new();

    log.push(Event::new(
        0,
        Severity::Info,
        EventCode::Boot,
        format!(
            "tick_ms={} total_ticks={}",
            config.tick_ms, config.total_ticks
        ),
    ));

    for tick in 0..config.total_ticks {
        let now_ms = clock.now_ms();
        let faults = feed.faults_at_tick(tick);
        for fault in &faults {
            log.push(Event::new(
                now_ms,
                Severity::Warn,
                EventCode::FaultInjected,
                format!("kind={} value={} tick={tick}", fault.kind, fault.value),
            ));
        }
        log.extend(machine.tick(now_ms, &faults));
        clock.advance();
    }

    log.push(Event::new(
        clock.now_ms(),
        Severity::Info,
        EventCode::Shutdown,
        "reason=completed_ticks",
    ));

    tracing::debug!(
        ticks = config.total_ticks,
        events = log.len(),
        final_state = %machine.state(),
        "run complete"
    );
    log
}
