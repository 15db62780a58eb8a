//! Run metrics derived from a completed event log.
//!
//! `MetricsCollector` folds events one at a time and never looks at the state
//! machine: everything it knows comes from event codes, times and detail text.

use serde::{Deserialize, Serialize};

use crate::{AnomalyKind, Event, EventCode};

/// Bump when fields are added, removed or reordered.
pub const METRICS_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub alarms_raised: u64,
    pub alarms_cleared: u64,

    // Time accounting (ms)
    pub alarmed_ms: u64,
    pub nominal_ms: u64,

    // Fault counters, from FAULT_INJECTED records
    pub faults_injected: u64,
    pub dropout_faults: u64,
    pub spike_faults: u64,

    // Raise-to-clear samples (ms)
    pub clear_durations_ms_total: u64,
    pub clear_durations_count: u64,
}

impl RunMetrics {
    /// `None` until at least one alarm window has been closed.
    pub fn mean_time_to_clear_ms(&self) -> Option<f64> {
        if self.clear_durations_count == 0 {
            return None;
        }
        Some(self.clear_durations_ms_total as f64 / self.clear_durations_count as f64)
    }
}

#[derive(Debug, Clone)]
pub struct MetricsCollector {
    tick_ms: u64,
    metrics: RunMetrics,
    /// Start time of the open alarm window, if any.
    window_start_ms: Option<u64>,
}

impl MetricsCollector {
    pub fn new(tick_ms: u64) -> Self {
        Self {
            tick_ms,
            metrics: RunMetrics::default(),
            window_start_ms: None,
        }
    }

    pub fn consume(&mut self, event: &Event) {
        match event.code {
            EventCode::FaultInjected => {
                self.metrics.faults_injected += 1;
                match event.field("kind").map(AnomalyKind::from) {
                    Some(AnomalyKind::Dropout) => self.metrics.dropout_faults += 1,
                    Some(AnomalyKind::SensorSpike) => self.metrics.spike_faults += 1,
                    Some(AnomalyKind::Other(_)) | None => {}
                }
            }
            EventCode::AlarmRaised => {
                self.metrics.alarms_raised += 1;
                if self.window_start_ms.is_none() {
                    self.window_start_ms = Some(event.t_ms);
                }
            }
            EventCode::AlarmCleared => {
                self.metrics.alarms_cleared += 1;
                if let Some(start) = self.window_start_ms.take() {
                    self.metrics.clear_durations_ms_total = self
                        .metrics
                        .clear_durations_ms_total
                        .saturating_add(event.t_ms.saturating_sub(start));
                    self.metrics.clear_durations_count += 1;
                }
            }
            EventCode::AppTick => {
                let bucket = if self.window_start_ms.is_some() {
                    &mut self.metrics.alarmed_ms
                } else {
                    &mut self.metrics.nominal_ms
                };
                *bucket = bucket.saturating_add(self.tick_ms);
            }
            EventCode::StateTransition
            | EventCode::AlarmPendingRaise
            | EventCode::AlarmPendingClear
            | EventCode::Boot
            | EventCode::Shutdown => {}
        }
    }

    pub fn snapshot(&self) -> RunMetrics {
        self.metrics.clone()
    }
}

/// Fold a whole log through a fresh collector.
pub fn compute_metrics<'a>(
    events: impl IntoIterator<Item = &'a Event>,
    tick_ms: u64,
) -> RunMetrics {
    let mut collector = MetricsCollector::new(tick_ms);
    for event in events {
        collector.consume(event);
    }
    collector.snapshot()
}
