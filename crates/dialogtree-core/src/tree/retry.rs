use std::{thread, time::Duration};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::tree::{
    error::CallbackError,
    model::{CounterpartReply, DialogueModel, Scenario, StrategyScore},
    turn::TurnPair,
};

/// How often and how patiently a failing callback is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Fixed pause after each failed attempt.
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: None,
            delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn bounded(max_attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: Some(max_attempts),
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    /// The last error is returned once retries are exhausted.
    pub fn run<T, F>(&self, label: &str, mut op: F) -> Result<T, CallbackError>
    where
        F: FnMut() -> Result<T, CallbackError>,
    {
        let mut attempts: u32 = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempts += 1;
                    warn!("{label} failed (attempt {attempts}): {err}");
                    if self.max_attempts.is_some_and(|max| attempts >= max) {
                        return Err(err);
                    }
                    if self.delay_ms > 0 {
                        thread::sleep(self.delay());
                    }
                }
            }
        }
    }
}

/// Applies a `RetryPolicy` uniformly to every callback of the wrapped model.
#[derive(Debug, Clone)]
pub struct Retrying<M> {
    inner: M,
    policy: RetryPolicy,
}

impl<M> Retrying<M> {
    pub fn new(inner: M, policy: RetryPolicy) -> Self {
        Retrying { inner, policy }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn into_inner(self) -> M {
        self.inner
    }
}

impl<M: DialogueModel> DialogueModel for Retrying<M> {
    fn score_strategies(&mut self, history: &[TurnPair]) -> Result<Vec<StrategyScore>, CallbackError> {
        let inner = &mut self.inner;
        self.policy
            .run("score_strategies", || inner.score_strategies(history))
    }

    fn respond(&mut self, history: &[TurnPair], strategy: &str) -> Result<String, CallbackError> {
        let inner = &mut self.inner;
        self.policy.run("respond", || inner.respond(history, strategy))
    }

    fn counterpart(
        &mut self,
        scenario: &Scenario,
        history: &[TurnPair],
    ) -> Result<CounterpartReply, CallbackError> {
        let inner = &mut self.inner;
        self.policy
            .run("counterpart", || inner.counterpart(scenario, history))
    }

    fn evaluate(&mut self, history: &[TurnPair], simulated_rounds: usize) -> Result<f64, CallbackError> {
        let inner = &mut self.inner;
        self.policy
            .run("evaluate", || inner.evaluate(history, simulated_rounds))
    }
}
