use serde::{Deserialize, Serialize};

use crate::tree::{error::CallbackError, turn::TurnPair};

/// Free-form context describing one scenario. Opaque to the engine and only
/// forwarded to the counterpart generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub description: String,
    pub scene: String,
}

/// One candidate strategy with its prior. Higher is more preferred; priors need
/// not sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyScore {
    pub strategy: String,
    pub score: f64,
}

impl StrategyScore {
    pub fn new(strategy: impl Into<String>, score: f64) -> Self {
        StrategyScore {
            strategy: strategy.into(),
            score,
        }
    }
}

/// Counterpart turn. `ends` marks the branch terminal, in which case `text` is
/// usually `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterpartReply {
    pub text: Option<String>,
    pub ends: bool,
}

impl CounterpartReply {
    pub fn says(text: impl Into<String>) -> Self {
        CounterpartReply {
            text: Some(text.into()),
            ends: false,
        }
    }

    pub fn end() -> Self {
        CounterpartReply {
            text: None,
            ends: true,
        }
    }
}

/// The four external collaborators the engine drives.
///
/// Every trajectory handed in is in root-to-leaf order. For `counterpart` the
/// last pair holds the fresh responder turn with `counterpart: None`.
pub trait DialogueModel {
    /// Score candidate strategies for the next responder turn.
    fn score_strategies(&mut self, history: &[TurnPair]) -> Result<Vec<StrategyScore>, CallbackError>;

    /// Generate the responder turn for `strategy`.
    fn respond(&mut self, history: &[TurnPair], strategy: &str) -> Result<String, CallbackError>;

    /// Generate the counterpart's reply, or signal that the conversation ended.
    fn counterpart(
        &mut self,
        scenario: &Scenario,
        history: &[TurnPair],
    ) -> Result<CounterpartReply, CallbackError>;

    /// Rate a trajectory whose last `simulated_rounds` pairs came from a rollout.
    fn evaluate(&mut self, history: &[TurnPair], simulated_rounds: usize) -> Result<f64, CallbackError>;
}

impl<M: DialogueModel + ?Sized> DialogueModel for &mut M {
    fn score_strategies(&mut self, history: &[TurnPair]) -> Result<Vec<StrategyScore>, CallbackError> {
        (**self).score_strategies(history)
    }

    fn respond(&mut self, history: &[TurnPair], strategy: &str) -> Result<String, CallbackError> {
        (**self).respond(history, strategy)
    }

    fn counterpart(
        &mut self,
        scenario: &Scenario,
        history: &[TurnPair],
    ) -> Result<CounterpartReply, CallbackError> {
        (**self).counterpart(scenario, history)
    }

    fn evaluate(&mut self, history: &[TurnPair], simulated_rounds: usize) -> Result<f64, CallbackError> {
        (**self).evaluate(history, simulated_rounds)
    }
}

/// Adapts four closures into a `DialogueModel`.
pub struct ClosureModel<FScore, FRespond, FCounter, FEval> {
    pub score: FScore,
    pub respond: FRespond,
    pub counterpart: FCounter,
    pub evaluate: FEval,
}

impl<FScore, FRespond, FCounter, FEval> DialogueModel
    for ClosureModel<FScore, FRespond, FCounter, FEval>
where
    FScore: FnMut(&[TurnPair]) -> Result<Vec<StrategyScore>, CallbackError>,
    FRespond: FnMut(&[TurnPair], &str) -> Result<String, CallbackError>,
    FCounter: FnMut(&Scenario, &[TurnPair]) -> Result<CounterpartReply, CallbackError>,
    FEval: FnMut(&[TurnPair], usize) -> Result<f64, CallbackError>,
{
    fn score_strategies(&mut self, history: &[TurnPair]) -> Result<Vec<StrategyScore>, CallbackError> {
        (self.score)(history)
    }

    fn respond(&mut self, history: &[TurnPair], strategy: &str) -> Result<String, CallbackError> {
        (self.respond)(history, strategy)
    }

    fn counterpart(
        &mut self,
        scenario: &Scenario,
        history: &[TurnPair],
    ) -> Result<CounterpartReply, CallbackError> {
        (self.counterpart)(scenario, history)
    }

    fn evaluate(&mut self, history: &[TurnPair], simulated_rounds: usize) -> Result<f64, CallbackError> {
        (self.evaluate)(history, simulated_rounds)
    }
}

/// Normalize raw ratings into priors with a tempered softmax.
///
/// Larger temperatures flatten the distribution. An empty input stays empty.
pub fn softmax_scores(raw: &[(String, f64)], temperature: f64) -> Vec<StrategyScore> {
    let max = raw
        .iter()
        .map(|(_, value)| *value)
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = raw
        .iter()
        .map(|(_, value)| ((value - max) / temperature).exp())
        .collect();
    let total: f64 = exps.iter().sum();

    raw.iter()
        .zip(exps)
        .map(|((strategy, _), exp)| StrategyScore::new(strategy.clone(), exp / total))
        .collect()
}
