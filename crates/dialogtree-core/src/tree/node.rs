use serde::{Deserialize, Serialize};

use crate::tree::{
    ids::NodeId,
    stats::NodeStats,
    turn::{Turn, TurnPair},
};

/// Payload of a node. Children are created `Pending` and become `Materialized`
/// once the generation callbacks produced their turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Payload {
    Pending,
    Materialized(Turn),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One point of the dialogue where `strategy` was (or will be) applied.
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
    strategy: String,
    strategy_score: f64,
    stats: NodeStats,
    pucb: f64,
    payload: Payload,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    feedback: Vec<String>,
}

impl Node {
    /// Create a new pending node
    pub(crate) fn new(
        parent: Option<NodeId>,
        depth: usize,
        strategy: impl Into<String>,
        strategy_score: f64,
    ) -> Self {
        Node {
            parent,
            children: Vec::new(),
            depth,
            strategy: strategy.into(),
            strategy_score,
            stats: NodeStats::new(),
            pucb: 0.0,
            payload: Payload::Pending,
            feedback: Vec::new(),
        }
    }

    /// Return the parent of this node, `None` for the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in the order they were expanded
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of turn pairs from the root through this node (root is 1)
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// Prior plausibility reported by the strategy scorer
    pub fn strategy_score(&self) -> f64 {
        self.strategy_score
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    /// Visit count `N`
    pub fn visits(&self) -> u64 {
        self.stats.visits()
    }

    /// Mean value `Q`
    pub fn q(&self) -> f64 {
        self.stats.q()
    }

    pub fn pucb(&self) -> f64 {
        self.pucb
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Generated turn, if the node has been materialized
    pub fn turn(&self) -> Option<&Turn> {
        match &self.payload {
            Payload::Materialized(turn) => Some(turn),
            Payload::Pending => None,
        }
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self.payload, Payload::Materialized(_))
    }

    /// Check function to see if the conversation ended at this node
    pub fn is_terminal(&self) -> bool {
        self.turn().is_some_and(|turn| turn.is_terminal)
    }

    /// Recorded "bad" feedback items
    pub fn feedback(&self) -> &[String] {
        &self.feedback
    }

    /// The turn pair this node contributes to a trajectory
    pub fn turn_pair(&self) -> Option<TurnPair> {
        self.turn().map(|turn| TurnPair {
            strategy: self.strategy.clone(),
            responder: turn.responder.clone(),
            counterpart: turn.counterpart.clone(),
        })
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn stats_mut(&mut self) -> &mut NodeStats {
        &mut self.stats
    }

    pub(crate) fn set_stats(&mut self, stats: NodeStats) {
        self.stats = stats;
    }

    pub(crate) fn set_pucb(&mut self, pucb: f64) {
        self.pucb = pucb;
    }

    pub(crate) fn set_payload(&mut self, turn: Turn) {
        self.payload = Payload::Materialized(turn);
    }

    pub(crate) fn turn_mut(&mut self) -> Option<&mut Turn> {
        match &mut self.payload {
            Payload::Materialized(turn) => Some(turn),
            Payload::Pending => None,
        }
    }

    pub(crate) fn set_feedback(&mut self, feedback: Vec<String>) {
        self.feedback = feedback;
    }
}
