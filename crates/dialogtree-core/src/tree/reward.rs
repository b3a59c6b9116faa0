use crate::tree::{error::CallbackError, model::DialogueModel, turn::TurnPair};

/// Evaluator output shifted by a fixed bias, used to recenter an external
/// scorer's scale around zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardPolicy {
    bias: f64,
}

impl RewardPolicy {
    pub fn new(bias: f64) -> Self {
        RewardPolicy { bias }
    }

    /// `evaluate(history, simulated_rounds) + bias`
    pub fn reward<M: DialogueModel + ?Sized>(
        &self,
        model: &mut M,
        history: &[TurnPair],
        simulated_rounds: usize,
    ) -> Result<f64, CallbackError> {
        Ok(model.evaluate(history, simulated_rounds)? + self.bias)
    }
}
