//! Debounced alarm decision engine.
//!
//! No IO, no clocks. One decision per call, fully determined by the machine's
//! state and the tick's resolved reading.

mod feed;
mod log;
mod machine;
pub mod metrics;
mod resolver;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use feed::{FaultFeed, NoFaults};
pub use log::EventLog;
pub use machine::{AlarmMachine, TickEvents};
pub use metrics::{compute_metrics, MetricsCollector, RunMetrics};
pub use resolver::resolve;
pub use types::*;

#[cfg(test)]
mod tests;
