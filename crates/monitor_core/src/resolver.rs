use crate::{Anomaly, AnomalyKind, Reading};

/// Combine the nominal baseline with one tick's anomalies.
///
/// Any `dropout` makes the reading absent, wherever it sits in the list.
/// Otherwise the last `sensor_spike` wins. Unrecognized kinds are ignored.
pub fn resolve(baseline: i64, anomalies: &[Anomaly]) -> Reading {
    if anomalies.iter().any(|a| a.kind == AnomalyKind::Dropout) {
        return Reading::Absent;
    }
    let spike = anomalies
        .iter()
        .rev()
        .find(|a| a.kind == AnomalyKind::SensorSpike)
        .map(|a| a.value);
    Reading::Present(spike.unwrap_or(baseline))
}
