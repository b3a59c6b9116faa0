use serde::{Deserialize, Serialize};

/// One exchange of a dialogue: the responder speaks using `strategy`, then the
/// counterpart answers. `counterpart` is `None` when the counterpart ended the
/// conversation or has not replied yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnPair {
    pub strategy: String,
    pub responder: String,
    pub counterpart: Option<String>,
}

impl TurnPair {
    /// A responder turn still waiting for the counterpart's reply.
    pub fn pending(strategy: impl Into<String>, responder: impl Into<String>) -> Self {
        TurnPair {
            strategy: strategy.into(),
            responder: responder.into(),
            counterpart: None,
        }
    }
}

/// Root-to-node sequence of turn pairs handed to every callback.
pub type Trajectory = Vec<TurnPair>;

/// Generated content of a materialized node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub responder: String,
    pub counterpart: Option<String>,
    pub is_terminal: bool,
}
