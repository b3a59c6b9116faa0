use std::time::Duration;

use dialogtree_core::{
    CallbackError, CounterpartReply, DialogueModel, RetryPolicy, Retrying, Scenario,
    StrategyScore, TurnPair,
};

/// Fails the first `failures` scorer calls.
struct Flaky {
    failures: usize,
    calls: usize,
}

impl DialogueModel for Flaky {
    fn score_strategies(&mut self, _history: &[TurnPair]) -> Result<Vec<StrategyScore>, CallbackError> {
        self.calls += 1;
        if self.calls <= self.failures {
            return Err(CallbackError::new(format!("malformed output #{}", self.calls)));
        }
        Ok(vec![StrategyScore::new("listen", 1.0)])
    }

    fn respond(&mut self, _history: &[TurnPair], _strategy: &str) -> Result<String, CallbackError> {
        Ok(String::new())
    }

    fn counterpart(
        &mut self,
        _scenario: &Scenario,
        _history: &[TurnPair],
    ) -> Result<CounterpartReply, CallbackError> {
        Ok(CounterpartReply::end())
    }

    fn evaluate(&mut self, _history: &[TurnPair], _simulated_rounds: usize) -> Result<f64, CallbackError> {
        Ok(0.0)
    }
}

#[test]
fn transient_failures_are_absorbed() {
    let mut model = Retrying::new(
        Flaky { failures: 2, calls: 0 },
        RetryPolicy::bounded(3, Duration::ZERO),
    );
    let scores = model.score_strategies(&[]).expect("third attempt succeeds");
    assert_eq!(scores.len(), 1);
    assert_eq!(model.inner().calls, 3);
}

#[test]
fn exhausted_retries_surface_the_last_error() {
    let mut model = Retrying::new(
        Flaky { failures: 5, calls: 0 },
        RetryPolicy::bounded(2, Duration::ZERO),
    );
    let err = model.score_strategies(&[]).expect_err("retries run out");
    assert_eq!(err.message(), "malformed output #2");
    assert_eq!(model.into_inner().calls, 2);
}

#[test]
fn unbounded_policy_keeps_trying() {
    let policy = RetryPolicy {
        max_attempts: None,
        delay_ms: 0,
    };
    let mut model = Retrying::new(Flaky { failures: 20, calls: 0 }, policy);
    model.score_strategies(&[]).expect("eventually succeeds");
    assert_eq!(model.inner().calls, 21);
}

#[test]
fn oversized_delays_saturate_instead_of_wrapping() {
    let policy = RetryPolicy::bounded(1, Duration::MAX);
    assert_eq!(policy.delay_ms, u64::MAX);
    assert_eq!(policy.delay(), Duration::from_millis(u64::MAX));

    let policy = RetryPolicy::bounded(1, Duration::from_secs(2));
    assert_eq!(policy.delay_ms, 2000);
}
