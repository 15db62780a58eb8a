use crate::Anomaly;

/// Source of scheduled faults, queried once per tick by the driver.
pub trait FaultFeed {
    /// Anomalies scheduled for `tick`, in schedule order.
    fn faults_at_tick(&self, tick: u64) -> Vec<Anomaly>;
}

/// A feed that never injects anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaults;

impl FaultFeed for NoFaults {
    fn faults_at_tick(&self, _tick: u64) -> Vec<Anomaly> {
        Vec::new()
    }
}

impl FaultFeed for [Anomaly] {
    fn faults_at_tick(&self, tick: u64) -> Vec<Anomaly> {
        self.iter().filter(|a| a.tick == tick).cloned().collect()
    }
}

impl FaultFeed for Vec<Anomaly> {
    fn faults_at_tick(&self, tick: u64) -> Vec<Anomaly> {
        self.as_slice().faults_at_tick(tick)
    }
}
