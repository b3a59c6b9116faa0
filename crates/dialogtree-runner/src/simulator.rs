use dialogtree_core::{
    CallbackError, CounterpartReply, DialogueModel, Scenario, StrategyScore, TurnPair,
    softmax_scores,
};
use fastmurmur3::murmur3_x64_128;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Strategy labels offered when none are configured.
pub const DEFAULT_STRATEGIES: [&str; 8] = [
    "Emotional Validation",
    "Affirmation",
    "Collaborative Planning",
    "Empathetic Statements",
    "Avoid Judgment and Criticism",
    "Provide Different Perspectives",
    "Reframe Negative Thoughts",
    "Share Information",
];

/// Temperature applied to the integer strategy ratings.
pub const RATING_TEMPERATURE: f64 = 5.0;

const RESPONSES: [&str; 4] = [
    "That sounds really difficult.",
    "What do you think would help most right now?",
    "It makes sense that you feel this way.",
    "Have you been able to talk to anyone about it?",
];

const REPLIES: [&str; 4] = [
    "I guess so, but it still weighs on me.",
    "I'm not sure where to start.",
    "Yes, that is exactly how it feels.",
    "Maybe, I haven't really thought about it.",
];

#[derive(Debug, Clone)]
/// Offline dialogue model with seeded, history-keyed randomness.
///
/// Every callback draws from an RNG seeded by the model seed and the exact
/// trajectory it receives, so the same history always yields the same turn.
/// This keeps interrupted and resumed runs identical to uninterrupted ones.
pub struct SeededDialogue {
    seed: u64,
    strategies: Vec<String>,
    end_probability: f64,
    max_pairs: usize,
}

impl SeededDialogue {
    /// Create a model with deterministic RNG seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            strategies: DEFAULT_STRATEGIES.iter().map(|s| s.to_string()).collect(),
            end_probability: 0.15,
            max_pairs: 8,
        }
    }

    pub fn with_strategies<I, S>(mut self, strategies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strategies = strategies.into_iter().map(Into::into).collect();
        self
    }

    /// Chance that the counterpart ends the dialogue on any turn.
    pub fn with_end_probability(mut self, end_probability: f64) -> Self {
        self.end_probability = end_probability.clamp(0.0, 1.0);
        self
    }

    /// The counterpart always ends once the trajectory holds this many pairs.
    pub fn with_max_pairs(mut self, max_pairs: usize) -> Self {
        self.max_pairs = max_pairs;
        self
    }

    fn rng_for(&self, callback: &str, history: &[TurnPair], extra: &str) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(history_key(self.seed, callback, history, extra))
    }

    /// Rating of the responder turn closing `history`, in `[0, 5)`.
    fn rate_turn(&self, history: &[TurnPair]) -> f64 {
        self.rng_for("rate", history, "").gen_range(0.0..5.0)
    }
}

/// Length-prefixed byte encoding hashed with Murmur3, so the key is identical
/// across platforms and compiler releases.
fn history_key(seed: u64, callback: &str, history: &[TurnPair], extra: &str) -> u64 {
    fn push(bytes: &mut Vec<u8>, field: Option<&str>) {
        match field {
            Some(text) => {
                bytes.push(1);
                bytes.extend_from_slice(&(text.len() as u64).to_le_bytes());
                bytes.extend_from_slice(text.as_bytes());
            }
            None => bytes.push(0),
        }
    }

    let mut bytes = seed.to_le_bytes().to_vec();
    push(&mut bytes, Some(callback));
    for pair in history {
        push(&mut bytes, Some(&pair.strategy));
        push(&mut bytes, Some(&pair.responder));
        push(&mut bytes, pair.counterpart.as_deref());
    }
    push(&mut bytes, Some(extra));

    let hash = murmur3_x64_128(&bytes, 0);
    (hash as u64) ^ ((hash >> 64) as u64)
}

impl DialogueModel for SeededDialogue {
    fn score_strategies(&mut self, history: &[TurnPair]) -> Result<Vec<StrategyScore>, CallbackError> {
        if self.strategies.is_empty() {
            return Err(CallbackError::new("no strategies configured"));
        }
        let mut rng = self.rng_for("score", history, "");
        let raw: Vec<(String, f64)> = self
            .strategies
            .iter()
            .map(|strategy| (strategy.clone(), f64::from(rng.gen_range(0u8..=10))))
            .collect();
        Ok(softmax_scores(&raw, RATING_TEMPERATURE))
    }

    fn respond(&mut self, history: &[TurnPair], strategy: &str) -> Result<String, CallbackError> {
        let mut rng = self.rng_for("respond", history, strategy);
        let line = RESPONSES[rng.gen_range(0..RESPONSES.len())];
        Ok(format!("({strategy}) {line}"))
    }

    fn counterpart(
        &mut self,
        scenario: &Scenario,
        history: &[TurnPair],
    ) -> Result<CounterpartReply, CallbackError> {
        if history.len() >= self.max_pairs {
            return Ok(CounterpartReply::end());
        }
        let mut rng = self.rng_for("counterpart", history, &scenario.scene);
        if history.len() > 1 && rng.gen_bool(self.end_probability) {
            return Ok(CounterpartReply::end());
        }
        let line = REPLIES[rng.gen_range(0..REPLIES.len())];
        if history.len() <= 1 && !scenario.description.is_empty() {
            Ok(CounterpartReply::says(format!("{} {line}", scenario.description)))
        } else {
            Ok(CounterpartReply::says(line))
        }
    }

    /// Mean rating of the last `simulated_rounds + 1` responder turns.
    fn evaluate(&mut self, history: &[TurnPair], simulated_rounds: usize) -> Result<f64, CallbackError> {
        // the opening turn is never rated
        let rated = history.len().saturating_sub(1);
        let window = (simulated_rounds + 1).min(rated);
        if window == 0 {
            return Ok(0.0);
        }
        let total: f64 = (history.len() - window + 1..=history.len())
            .map(|end| self.rate_turn(&history[..end]))
            .sum();
        Ok(total / window as f64)
    }
}
