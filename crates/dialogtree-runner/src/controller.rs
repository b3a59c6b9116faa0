use std::path::PathBuf;

use dialogtree_core::{DialogueModel, Engine, GoldTrace, Scenario, SearchConfig, Trajectory};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{RunnerError, load_run_state, save_run_state};

/// Iteration and terminal-count thresholds of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLimits {
    pub min_iterations: usize,
    pub min_terminal: usize,
    pub max_iterations: usize,
    pub max_terminal: usize,
}

impl Default for RunLimits {
    fn default() -> Self {
        RunLimits {
            min_iterations: 100,
            min_terminal: 1,
            max_iterations: 200,
            max_terminal: 25,
        }
    }
}

impl RunLimits {
    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.min_iterations > self.max_iterations {
            return Err(RunnerError::InvalidConfig(format!(
                "limits.min_iterations ({}) exceeds limits.max_iterations ({})",
                self.min_iterations, self.max_iterations
            )));
        }
        if self.min_terminal > self.max_terminal {
            return Err(RunnerError::InvalidConfig(format!(
                "limits.min_terminal ({}) exceeds limits.max_terminal ({})",
                self.min_terminal, self.max_terminal
            )));
        }
        Ok(())
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Enough iterations and enough terminal leaves.
    Satisfied,
    /// Terminal leaves reached `max_terminal`.
    TerminalCap,
    /// `max_iterations` iterations completed.
    Exhausted,
}

/// Early-stop decision taken before each iteration.
///
/// `next_is_terminal` describes the leaf the next iteration would select. A
/// run never stops early while that leaf is terminal.
pub fn should_stop(
    limits: &RunLimits,
    iterations: usize,
    terminal_count: usize,
    next_is_terminal: bool,
) -> Option<StopReason> {
    if next_is_terminal {
        return None;
    }
    if iterations >= limits.min_iterations && terminal_count >= limits.min_terminal {
        return Some(StopReason::Satisfied);
    }
    if terminal_count >= limits.max_terminal {
        return Some(StopReason::TerminalCap);
    }
    None
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub stop_reason: StopReason,
    pub iterations: usize,
    pub terminal_count: usize,
    /// Highest-value path from the root at stop time.
    pub best: Trajectory,
}

/// Drives one engine to a stop condition, persisting after every iteration.
pub struct RunController<M> {
    engine: Engine<M>,
    limits: RunLimits,
    checkpoint: PathBuf,
    iteration: usize,
}

impl<M: DialogueModel> RunController<M> {
    /// Resume from `checkpoint` when it exists, ignoring `scenario` and
    /// `gold`. Otherwise seed from `gold`, or start fresh when there is none.
    pub fn start(
        config: &SearchConfig,
        limits: RunLimits,
        checkpoint: impl Into<PathBuf>,
        scenario: Scenario,
        gold: Option<&GoldTrace>,
        model: M,
    ) -> Result<Self, RunnerError> {
        limits.validate()?;
        let checkpoint = checkpoint.into();

        let (engine, iteration) = if checkpoint.exists() {
            let state = load_run_state(&checkpoint)?;
            let iteration = state.iteration;
            info!(
                "resuming from {} at iteration {iteration}",
                checkpoint.display()
            );
            (
                Engine::from_run_state(config.clone(), state, model),
                iteration,
            )
        } else {
            match gold.filter(|trace| !trace.is_empty()) {
                Some(trace) => {
                    info!("seeding tree from a {}-message trace", trace.messages.len());
                    (Engine::seeded(config.clone(), scenario, trace, model)?, 0)
                }
                None => {
                    info!("starting fresh tree");
                    (Engine::fresh(config.clone(), scenario, model)?, 0)
                }
            }
        };

        Ok(RunController {
            engine,
            limits,
            checkpoint,
            iteration,
        })
    }

    /// Iterate until a stop condition holds or `max_iterations` is reached.
    pub fn run(&mut self) -> Result<RunOutcome, RunnerError> {
        while self.iteration < self.limits.max_iterations {
            let terminal_count = self.terminal_count()?;
            let next = self.engine.select()?;
            let next_is_terminal = self.engine.tree().node(next)?.is_terminal();

            if let Some(reason) =
                should_stop(&self.limits, self.iteration, terminal_count, next_is_terminal)
            {
                info!(
                    "stopping ({reason:?}) after {} iterations with {terminal_count} terminal leaves",
                    self.iteration
                );
                // the stop check may have materialized the selected leaf
                save_run_state(&self.checkpoint, &self.engine.run_state(self.iteration))?;
                return self.outcome(reason);
            }

            self.engine.step()?;
            self.iteration += 1;
            save_run_state(&self.checkpoint, &self.engine.run_state(self.iteration))?;
            debug!("iteration {} persisted", self.iteration);
        }

        info!("max iterations ({}) reached", self.limits.max_iterations);
        self.outcome(StopReason::Exhausted)
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn engine(&self) -> &Engine<M> {
        &self.engine
    }

    fn terminal_count(&self) -> Result<usize, RunnerError> {
        let tree = self.engine.tree();
        Ok(tree.count_terminal_descendants(tree.root_id())?)
    }

    fn outcome(&self, stop_reason: StopReason) -> Result<RunOutcome, RunnerError> {
        Ok(RunOutcome {
            stop_reason,
            iterations: self.iteration,
            terminal_count: self.terminal_count()?,
            best: self.engine.tree().best_trajectory_by_value()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> RunLimits {
        RunLimits {
            min_iterations: 5,
            min_terminal: 1,
            max_iterations: 10,
            max_terminal: 3,
        }
    }

    #[test]
    fn satisfied_needs_both_minimums() {
        assert_eq!(should_stop(&limits(), 4, 2, false), None);
        assert_eq!(should_stop(&limits(), 5, 0, false), None);
        assert_eq!(
            should_stop(&limits(), 5, 1, false),
            Some(StopReason::Satisfied)
        );
    }

    #[test]
    fn terminal_cap_applies_before_min_iterations() {
        assert_eq!(
            should_stop(&limits(), 2, 3, false),
            Some(StopReason::TerminalCap)
        );
    }

    #[test]
    fn terminal_selection_defers_every_stop() {
        assert_eq!(should_stop(&limits(), 5, 1, true), None);
        assert_eq!(should_stop(&limits(), 2, 3, true), None);
    }

    #[test]
    fn inverted_limits_are_rejected() {
        let mut inverted = limits();
        inverted.min_iterations = 11;
        assert!(inverted.validate().is_err());

        let mut inverted = limits();
        inverted.min_terminal = 4;
        assert!(inverted.validate().is_err());
        assert!(limits().validate().is_ok());
    }
}
