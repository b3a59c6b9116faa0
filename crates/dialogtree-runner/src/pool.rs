use dialogtree_core::{DialogueModel, Retrying};
use log::{error, info};
use rayon::{ThreadPoolBuilder, prelude::*};

use crate::{RunConfig, RunController, RunOutcome, RunnerError, ScenarioSpec, check_scenario_ids};

/// Result of one scenario in a batch.
#[derive(Debug)]
pub struct ScenarioReport {
    pub id: String,
    pub result: Result<RunOutcome, RunnerError>,
}

/// Run one scenario to completion with retries applied to every callback.
pub fn run_scenario<M: DialogueModel>(
    config: &RunConfig,
    spec: &ScenarioSpec,
    model: M,
) -> Result<RunOutcome, RunnerError> {
    let model = Retrying::new(model, config.retry);
    let gold = spec.gold_trace();
    let mut controller = RunController::start(
        &config.search,
        config.limits,
        config.checkpoint_path(&spec.id),
        spec.scenario(),
        gold.as_ref(),
        model,
    )?;
    controller.run()
}

/// Run every scenario on a pool of `config.workers` threads.
///
/// Each scenario owns its tree and model; `make_model` is called on the worker
/// that runs it. A failing scenario is reported and does not stop the others.
/// Reports come back in input order.
pub fn run_pool<M, F>(
    config: &RunConfig,
    scenarios: &[ScenarioSpec],
    make_model: F,
) -> Result<Vec<ScenarioReport>, RunnerError>
where
    M: DialogueModel,
    F: Fn(&ScenarioSpec) -> M + Sync,
{
    config.validate()?;
    check_scenario_ids(scenarios)?;
    let pool = ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()?;
    info!(
        "running {} scenarios on {} workers",
        scenarios.len(),
        config.workers
    );

    let reports: Vec<ScenarioReport> = pool.install(|| {
        scenarios
            .par_iter()
            .map(|spec| {
                let result = run_scenario(config, spec, make_model(spec));
                match &result {
                    Ok(outcome) => info!(
                        "scenario '{}' stopped ({:?}) after {} iterations",
                        spec.id, outcome.stop_reason, outcome.iterations
                    ),
                    Err(err) => error!("scenario '{}' aborted: {err}", spec.id),
                }
                ScenarioReport {
                    id: spec.id.clone(),
                    result,
                }
            })
            .collect()
    });
    Ok(reports)
}
