use std::collections::BTreeMap;

use monitor_core::{Anomaly, FaultFeed};

use crate::Scenario;

/// Scenario faults indexed by tick. Order within a tick follows the document.
#[derive(Debug, Clone, Default)]
pub struct ScenarioFeed {
    by_tick: BTreeMap<u64, Vec<Anomaly>>,
}

impl ScenarioFeed {
    pub fn new(scenario: &Scenario) -> Self {
        Self::from_faults(&scenario.faults)
    }

    pub fn from_faults(faults: &[Anomaly]) -> Self {
        let mut by_tick: BTreeMap<u64, Vec<Anomaly>> = BTreeMap::new();
        for fault in faults {
            by_tick.entry(fault.tick).or_default().push(fault.clone());
        }
        Self { by_tick }
    }

    /// Last tick with anything scheduled.
    pub fn last_tick(&self) -> Option<u64> {
        self.by_tick.keys().next_back().copied()
    }
}

impl FaultFeed for ScenarioFeed {
    fn faults_at_tick(&self, tick: u64) -> Vec<Anomaly> {
        self.by_tick.get(&tick).cloned().unwrap_or_default()
    }
}
