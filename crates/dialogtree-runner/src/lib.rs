mod config;
mod controller;
mod error;
mod io;
mod pool;
mod scenario;
mod simulator;

pub use config::RunConfig;
pub use controller::{RunController, RunLimits, RunOutcome, StopReason, should_stop};
pub use error::RunnerError;
pub use io::{check_scenario_ids, load_run_state, load_scenarios, save_run_state};
pub use pool::{ScenarioReport, run_pool, run_scenario};
pub use scenario::ScenarioSpec;
pub use simulator::{DEFAULT_STRATEGIES, RATING_TEMPERATURE, SeededDialogue};
