//! Collaborators around the alarm engine: scenario documents, config
//! overrides, the scenario fault feed, the fixed-step clock, the simulation
//! driver and run-artifact writers. Shared by `monitor_cli` and `monitor_bench`.

mod artifacts;
mod clock;
mod driver;
mod feed;
mod generate;
mod overrides;
mod scenario;

pub use artifacts::{create_run_dir, write_events_jsonl, write_metrics_json, write_run_info};
pub use clock::SimClock;
pub use driver::run_monitor;
pub use feed::ScenarioFeed;
pub use generate::{generate_scenario, FaultProfile};
pub use overrides::{apply_overrides, validate_config};
pub use scenario::{load_scenario, parse_scenario, Scenario};
