use crate::{CallbackError, CounterpartReply, DialogueModel, Scenario, StrategyScore, TurnPair};

/// Deterministic model that records every callback it receives.
#[derive(Debug, Clone)]
pub struct RecordingModel {
    pub priors: Vec<(String, f64)>,
    /// Counterpart ends once the trajectory reaches this many pairs.
    pub end_at_len: Option<usize>,
    pub evaluation: f64,
    pub fail_scorer: bool,
    pub score_calls: usize,
    /// Strategy labels along every history handed to the scorer.
    pub scored: Vec<Vec<String>>,
    pub respond_calls: usize,
    pub counterpart_calls: usize,
    /// `(trajectory length, simulated rounds)` of every evaluation.
    pub evaluations: Vec<(usize, usize)>,
}

impl RecordingModel {
    pub fn new(priors: &[(&str, f64)]) -> Self {
        RecordingModel {
            priors: priors
                .iter()
                .map(|(name, score)| (name.to_string(), *score))
                .collect(),
            end_at_len: None,
            evaluation: 1.0,
            fail_scorer: false,
            score_calls: 0,
            scored: Vec::new(),
            respond_calls: 0,
            counterpart_calls: 0,
            evaluations: Vec::new(),
        }
    }

    pub fn ending_at(mut self, len: usize) -> Self {
        self.end_at_len = Some(len);
        self
    }

    pub fn generator_calls(&self) -> usize {
        self.respond_calls + self.counterpart_calls
    }

    pub fn reset_counts(&mut self) {
        self.score_calls = 0;
        self.scored.clear();
        self.respond_calls = 0;
        self.counterpart_calls = 0;
        self.evaluations.clear();
    }
}

impl DialogueModel for RecordingModel {
    fn score_strategies(&mut self, history: &[TurnPair]) -> Result<Vec<StrategyScore>, CallbackError> {
        self.score_calls += 1;
        self.scored
            .push(history.iter().map(|pair| pair.strategy.clone()).collect());
        if self.fail_scorer {
            return Err(CallbackError::new("scorer unavailable"));
        }
        Ok(self
            .priors
            .iter()
            .map(|(name, score)| StrategyScore::new(name.clone(), *score))
            .collect())
    }

    fn respond(&mut self, history: &[TurnPair], strategy: &str) -> Result<String, CallbackError> {
        self.respond_calls += 1;
        Ok(format!("{strategy}@{}", history.len()))
    }

    fn counterpart(
        &mut self,
        _scenario: &Scenario,
        history: &[TurnPair],
    ) -> Result<CounterpartReply, CallbackError> {
        self.counterpart_calls += 1;
        match self.end_at_len {
            Some(len) if history.len() >= len => Ok(CounterpartReply::end()),
            _ => Ok(CounterpartReply::says(format!("reply {}", history.len()))),
        }
    }

    fn evaluate(&mut self, history: &[TurnPair], simulated_rounds: usize) -> Result<f64, CallbackError> {
        self.evaluations.push((history.len(), simulated_rounds));
        Ok(self.evaluation)
    }
}

pub fn three_way() -> RecordingModel {
    RecordingModel::new(&[("comfort", 0.5), ("plan", 0.3), ("inform", 0.2)])
}
