//! Type definitions for `monitor_core`.
//!
//! Alarm states, run configuration, anomalies, readings and the immutable
//! event record shared by the state machine, the event log and metrics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sensor value reported on ticks with no anomaly scheduled.
pub const NOMINAL_BASELINE: i64 = 500;

// ---------------------------------------------------------------------------
// Alarm state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmState {
    Nominal,
    PendingRaise,
    Alarmed,
    PendingClear,
}

impl AlarmState {
    pub const ALL: [AlarmState; 4] = [
        AlarmState::Nominal,
        AlarmState::PendingRaise,
        AlarmState::Alarmed,
        AlarmState::PendingClear,
    ];

    /// Row of the legal-transition table for `self`.
    ///
    /// Self-transitions are listed for every state; they never produce a
    /// `STATE_TRANSITION` record. `PendingClear` may return to `Alarmed` when a
    /// dropout arrives mid-clear. A stricter variant of this table that forbids
    /// `PendingClear -> Alarmed` exists in older tooling and is not supported here.
    pub fn legal_next(self) -> &'static [AlarmState] {
        use AlarmState::{Alarmed, Nominal, PendingClear, PendingRaise};
        match self {
            Nominal => &[Nominal, PendingRaise, Alarmed],
            PendingRaise => &[PendingRaise, Nominal, Alarmed],
            Alarmed => &[Alarmed, PendingClear],
            PendingClear => &[PendingClear, Nominal, Alarmed, PendingRaise],
        }
    }

    pub fn can_transition_to(self, to: AlarmState) -> bool {
        self.legal_next().contains(&to)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlarmState::Nominal => "NOMINAL",
            AlarmState::PendingRaise => "PENDING_RAISE",
            AlarmState::Alarmed => "ALARMED",
            AlarmState::PendingClear => "PENDING_CLEAR",
        }
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag carried by every `STATE_TRANSITION` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    DropoutReturned,
    DropoutImmediate,
    RaisePending,
    RaiseCommitted,
    Nominal,
    ClearPending,
    ClearCommitted,
}

impl TransitionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionReason::DropoutReturned => "dropout_returned",
            TransitionReason::DropoutImmediate => "dropout_immediate",
            TransitionReason::RaisePending => "raise_pending",
            TransitionReason::RaiseCommitted => "raise_committed",
            TransitionReason::Nominal => "nominal",
            TransitionReason::ClearPending => "clear_pending",
            TransitionReason::ClearCommitted => "clear_committed",
        }
    }
}

impl fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Immutable per-run parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub tick_ms: u64,
    pub total_ticks: u64,
    /// Inclusive lower bound of the alarm condition.
    pub spike_threshold: i64,
    /// Consecutive alarm-condition ticks before committing to `Alarmed`.
    pub raise_after: u32,
    /// Consecutive nominal ticks before committing back to `Nominal`.
    pub clear_after: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_ms: 10,
            total_ticks: 50,
            spike_threshold: 1000,
            raise_after: 2,
            clear_after: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Anomalies and readings
// ---------------------------------------------------------------------------

/// Kind of a scheduled fault.
///
/// Unrecognized kind strings are kept in `Other` so they can be echoed in the
/// log; they never influence the resolved reading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnomalyKind {
    Dropout,
    SensorSpike,
    Other(String),
}

impl AnomalyKind {
    pub fn as_str(&self) -> &str {
        match self {
            AnomalyKind::Dropout => "dropout",
            AnomalyKind::SensorSpike => "sensor_spike",
            AnomalyKind::Other(kind) => kind,
        }
    }
}

impl From<String> for AnomalyKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "dropout" => AnomalyKind::Dropout,
            "sensor_spike" => AnomalyKind::SensorSpike,
            _ => AnomalyKind::Other(kind),
        }
    }
}

impl From<&str> for AnomalyKind {
    fn from(kind: &str) -> Self {
        AnomalyKind::from(kind.to_string())
    }
}

impl From<AnomalyKind> for String {
    fn from(kind: AnomalyKind) -> Self {
        match kind {
            AnomalyKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    pub tick: u64,
    pub kind: AnomalyKind,
    pub value: i64,
}

impl Anomaly {
    pub fn new(tick: u64, kind: impl Into<AnomalyKind>, value: i64) -> Self {
        Self {
            tick,
            kind: kind.into(),
            value,
        }
    }
}

/// Resolved sensor value for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reading {
    Present(i64),
    /// Dropout: the sensor produced nothing.
    Absent,
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed event vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCode {
    AppTick,
    StateTransition,
    AlarmPendingRaise,
    AlarmRaised,
    AlarmPendingClear,
    AlarmCleared,
    /// Emitted by the driver, never by the state machine.
    FaultInjected,
    Boot,
    Shutdown,
}

impl EventCode {
    pub fn as_str(self) -> &'static str {
        match self {
            EventCode::AppTick => "APP_TICK",
            EventCode::StateTransition => "STATE_TRANSITION",
            EventCode::AlarmPendingRaise => "ALARM_PENDING_RAISE",
            EventCode::AlarmRaised => "ALARM_RAISED",
            EventCode::AlarmPendingClear => "ALARM_PENDING_CLEAR",
            EventCode::AlarmCleared => "ALARM_CLEARED",
            EventCode::FaultInjected => "FAULT_INJECTED",
            EventCode::Boot => "BOOT",
            EventCode::Shutdown => "SHUTDOWN",
        }
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub t_ms: u64,
    pub level: Severity,
    pub code: EventCode,
    /// Space-separated `key=value` tokens.
    pub detail: String,
}

impl Event {
    pub fn new(t_ms: u64, level: Severity, code: EventCode, detail: impl Into<String>) -> Self {
        Self {
            t_ms,
            level,
            code,
            detail: detail.into(),
        }
    }

    /// Looks up `key` among the detail tokens.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.detail.split_whitespace().find_map(|token| {
            let (k, v) = token.split_once('=')?;
            (k == key).then_some(v)
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:06}ms | {} | {} | {}",
            self.t_ms, self.level, self.code, self.detail
        )
    }
}
