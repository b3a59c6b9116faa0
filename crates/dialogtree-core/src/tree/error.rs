use std::{error::Error, fmt};

use crate::tree::ids::NodeId;

/// Structural contract violations on the search tree. These are programming
/// errors and are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Attempted to access a node id that does not exist in the arena.
    MissingNode { node_id: NodeId },
    /// Attempted to expand a node that already has children.
    AlreadyExpanded { node_id: NodeId },
    /// Attempted to simulate below a node that has no children yet.
    NotExpanded { node_id: NodeId },
    /// Attempted to expand or roll out from a terminal node.
    TerminalNode { node_id: NodeId },
    /// Attempted to materialize a node twice.
    AlreadyMaterialized { node_id: NodeId },
    /// Attempted to read the generated turn of a pending node.
    NotMaterialized { node_id: NodeId },
    /// Parent and child links disagree.
    InconsistentLink { parent: NodeId, child: NodeId },
    /// The arena holds no root node.
    EmptyTree,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::MissingNode { node_id } => {
                write!(f, "missing node with id {}", node_id.index())
            }
            TreeError::AlreadyExpanded { node_id } => {
                write!(f, "node {} has already been expanded", node_id.index())
            }
            TreeError::NotExpanded { node_id } => {
                write!(f, "node {} has not been expanded", node_id.index())
            }
            TreeError::TerminalNode { node_id } => {
                write!(f, "node {} is terminal", node_id.index())
            }
            TreeError::AlreadyMaterialized { node_id } => {
                write!(f, "node {} has already been materialized", node_id.index())
            }
            TreeError::NotMaterialized { node_id } => {
                write!(f, "node {} has not been materialized", node_id.index())
            }
            TreeError::InconsistentLink { parent, child } => write!(
                f,
                "node {} lists child {} whose parent link disagrees",
                parent.index(),
                child.index()
            ),
            TreeError::EmptyTree => write!(f, "tree has no root node"),
        }
    }
}

impl Error for TreeError {}

/// Failure reported by one of the dialogue callbacks.
#[derive(Debug)]
pub struct CallbackError {
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        CallbackError {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error (network failure, malformed output, ...).
    pub fn from_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        CallbackError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Error for CallbackError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn Error + 'static))
    }
}

/// Error type for engine operations.
#[derive(Debug)]
pub enum SearchError {
    Tree(TreeError),
    Callback(CallbackError),
    /// The strategy scorer returned no candidates.
    NoStrategies,
    /// A gold trace could not be turned into a tree.
    InvalidTrace(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::Tree(err) => write!(f, "tree error: {err}"),
            SearchError::Callback(err) => write!(f, "callback failed: {err}"),
            SearchError::NoStrategies => write!(f, "strategy scorer returned no candidates"),
            SearchError::InvalidTrace(reason) => write!(f, "invalid gold trace: {reason}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SearchError::Tree(err) => Some(err),
            SearchError::Callback(err) => Some(err),
            SearchError::NoStrategies | SearchError::InvalidTrace(_) => None,
        }
    }
}

impl From<TreeError> for SearchError {
    fn from(err: TreeError) -> Self {
        SearchError::Tree(err)
    }
}

impl From<CallbackError> for SearchError {
    fn from(err: CallbackError) -> Self {
        SearchError::Callback(err)
    }
}
