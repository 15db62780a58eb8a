use smallvec::SmallVec;

use crate::resolver::resolve;
use crate::{
    AlarmState, Anomaly, Event, EventCode, MonitorConfig, Reading, Severity, TransitionReason,
    NOMINAL_BASELINE,
};

/// Events produced by one decision. Never more than three:
/// `APP_TICK`, an optional `STATE_TRANSITION`, an optional alarm record.
pub type TickEvents = SmallVec<[Event; 4]>;

/// Debounced alarm state machine.
///
/// Holds the current state and the two streak counters. The raise and clear
/// streaks are each reset to zero before the other one starts counting, so the
/// two debounces never share a count.
#[derive(Debug, Clone)]
pub struct AlarmMachine {
    config: MonitorConfig,
    state: AlarmState,
    raise_streak: u32,
    clear_streak: u32,
    tick_count: u64,
}

impl AlarmMachine {
    /// `clear_after` must be at least 2: `Alarmed` may only leave through
    /// `PendingClear`, which takes one nominal tick of its own.
    pub fn new(config: MonitorConfig) -> Self {
        assert!(
            config.raise_after >= 1 && config.clear_after >= 2,
            "debounce counts out of range: raise_after={} (min 1), clear_after={} (min 2)",
            config.raise_after,
            config.clear_after,
        );
        Self {
            config,
            state: AlarmState::Nominal,
            raise_streak: 0,
            clear_streak: 0,
            tick_count: 0,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    pub fn raise_streak(&self) -> u32 {
        self.raise_streak
    }

    pub fn clear_streak(&self) -> u32 {
        self.clear_streak
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Resolve this tick's anomalies against the nominal baseline and decide.
    pub fn tick(&mut self, now_ms: u64, anomalies: &[Anomaly]) -> TickEvents {
        self.step(now_ms, resolve(NOMINAL_BASELINE, anomalies))
    }

    /// Advance by one tick with an already-resolved reading.
    ///
    /// Decision order:
    /// 1. Absent reading: immediate alarm, no debounce.
    /// 2. Present reading at or above threshold: debounced raise.
    /// 3. Present reading below threshold: debounced clear.
    pub fn step(&mut self, now_ms: u64, reading: Reading) -> TickEvents {
        let mut events = TickEvents::new();
        events.push(Event::new(
            now_ms,
            Severity::Info,
            EventCode::AppTick,
            format!("tick={}", self.tick_count),
        ));

        match reading {
            Reading::Absent => self.on_dropout(now_ms, &mut events),
            Reading::Present(value) if value >= self.config.spike_threshold => {
                self.on_alarm_condition(now_ms, value, &mut events);
            }
            Reading::Present(value) => self.on_nominal_condition(now_ms, value, &mut events),
        }

        self.tick_count += 1;
        events
    }

    fn on_dropout(&mut self, now_ms: u64, events: &mut TickEvents) {
        self.raise_streak = 0;
        self.clear_streak = 0;

        let reason = match self.state {
            // Already alarmed: stay silent so a long dropout raises once.
            AlarmState::Alarmed => return,
            AlarmState::PendingClear => TransitionReason::DropoutReturned,
            AlarmState::Nominal | AlarmState::PendingRaise => TransitionReason::DropoutImmediate,
        };
        self.transition(now_ms, AlarmState::Alarmed, reason, events);
        events.push(Event::new(
            now_ms,
            Severity::Error,
            EventCode::AlarmRaised,
            "reason=sensor_dropout",
        ));
    }

    fn on_alarm_condition(&mut self, now_ms: u64, value: i64, events: &mut TickEvents) {
        self.clear_streak = 0;

        match self.state {
            AlarmState::PendingClear => {
                // The condition came back before the clear committed: start a
                // fresh raise debounce rather than re-raising outright.
                self.raise_streak = 1;
                self.transition(
                    now_ms,
                    AlarmState::PendingRaise,
                    TransitionReason::RaisePending,
                    events,
                );
                self.push_pending_raise(now_ms, value, events);
            }
            AlarmState::Alarmed => {
                self.raise_streak = 0;
            }
            AlarmState::Nominal | AlarmState::PendingRaise => {
                self.raise_streak += 1;
                if self.raise_streak < self.config.raise_after {
                    self.transition(
                        now_ms,
                        AlarmState::PendingRaise,
                        TransitionReason::RaisePending,
                        events,
                    );
                    self.push_pending_raise(now_ms, value, events);
                } else {
                    self.raise_streak = 0;
                    self.transition(
                        now_ms,
                        AlarmState::Alarmed,
                        TransitionReason::RaiseCommitted,
                        events,
                    );
                    events.push(Event::new(
                        now_ms,
                        Severity::Error,
                        EventCode::AlarmRaised,
                        format!("reason=sensor_spike value={value}"),
                    ));
                }
            }
        }
    }

    fn on_nominal_condition(&mut self, now_ms: u64, value: i64, events: &mut TickEvents) {
        self.raise_streak = 0;

        if !matches!(self.state, AlarmState::Alarmed | AlarmState::PendingClear) {
            self.clear_streak = 0;
            self.transition(now_ms, AlarmState::Nominal, TransitionReason::Nominal, events);
            return;
        }

        self.clear_streak += 1;
        if self.clear_streak < self.config.clear_after {
            self.transition(
                now_ms,
                AlarmState::PendingClear,
                TransitionReason::ClearPending,
                events,
            );
            events.push(Event::new(
                now_ms,
                Severity::Info,
                EventCode::AlarmPendingClear,
                format!(
                    "streak={} needed={} value={value}",
                    self.clear_streak, self.config.clear_after
                ),
            ));
        } else {
            self.clear_streak = 0;
            self.transition(
                now_ms,
                AlarmState::Nominal,
                TransitionReason::ClearCommitted,
                events,
            );
            events.push(Event::new(
                now_ms,
                Severity::Info,
                EventCode::AlarmCleared,
                "reason=nominal",
            ));
        }
    }

    fn push_pending_raise(&self, now_ms: u64, value: i64, events: &mut TickEvents) {
        events.push(Event::new(
            now_ms,
            Severity::Warn,
            EventCode::AlarmPendingRaise,
            format!(
                "reason=sensor_spike streak={} needed={} value={value}",
                self.raise_streak, self.config.raise_after
            ),
        ));
    }

    /// Move to `to`, recording a `STATE_TRANSITION` when the state changes.
    ///
    /// Panics on a transition missing from the legal-transition table: that can
    /// only come from a defect in the decision policy, never from input data.
    pub(crate) fn transition(
        &mut self,
        now_ms: u64,
        to: AlarmState,
        reason: TransitionReason,
        events: &mut TickEvents,
    ) {
        let from = self.state;
        if from == to {
            return;
        }
        assert!(
            from.can_transition_to(to),
            "illegal transition {from} -> {to} (reason={reason})"
        );
        self.state = to;
        events.push(Event::new(
            now_ms,
            Severity::Info,
            EventCode::StateTransition,
            format!("from={from} to={to} reason={reason}"),
        ));
    }
}
