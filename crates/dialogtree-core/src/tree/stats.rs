use serde::{Deserialize, Serialize};

/// Stores the numbers MCTS updates constantly.
/// `q` is kept as a running mean rather than a value sum so seeded nodes can
/// carry an arbitrary mean without a matching history of rewards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    visits: u64,
    q: f64,
}

impl NodeStats {
    pub fn new() -> Self {
        NodeStats { visits: 0, q: 0.0 }
    }

    /// Synthetic statistics, used when a node is seeded from a gold trace.
    pub fn seeded(visits: u64, q: f64) -> Self {
        NodeStats { visits, q }
    }

    /// Retrieve the amount of backpropagations through this node
    pub fn visits(&self) -> u64 {
        self.visits
    }

    /// Mean of every reward recorded so far
    pub fn q(&self) -> f64 {
        self.q
    }

    /// Fold one reward into the running mean and count the visit.
    pub fn record(&mut self, reward: f64) {
        self.q = (self.q * self.visits as f64 + reward) / (self.visits + 1) as f64;
        self.visits += 1;
    }

    /// Exploration-adjusted selection score of a child.
    ///
    /// `Q + c * prior * sqrt(N_parent) / (N + 1)`
    pub fn pucb(&self, prior: f64, parent_visits: u64, c: f64) -> f64 {
        self.q + c * prior * (parent_visits as f64).sqrt() / (self.visits + 1) as f64
    }
}
