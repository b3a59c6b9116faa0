use std::{error::Error, fmt};

use serde::{Deserialize, Serialize};

use crate::tree::{error::TreeError, model::Scenario, rollout::RolloutCap, search_tree::Tree};

pub const RUN_STATE_SCHEMA_VERSION: u32 = 1;

/// The unit of progress written after every completed iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub schema_version: u32,
    pub c: f64,
    pub rollout_cap: RolloutCap,
    pub scenario: Scenario,
    /// Iterations completed when the state was captured.
    pub iteration: usize,
    pub tree: Tree,
}

impl RunState {
    pub fn new(
        c: f64,
        rollout_cap: RolloutCap,
        scenario: Scenario,
        iteration: usize,
        tree: Tree,
    ) -> Self {
        RunState {
            schema_version: RUN_STATE_SCHEMA_VERSION,
            c,
            rollout_cap,
            scenario,
            iteration,
            tree,
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(SnapshotError::Json)
    }

    /// Parse a state and check the tree's structure before handing it out.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let state: RunState = serde_json::from_str(json).map_err(SnapshotError::Json)?;
        if state.schema_version != RUN_STATE_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion(state.schema_version));
        }
        state.tree.validate().map_err(SnapshotError::Tree)?;
        Ok(state)
    }
}

/// Error type for reading and writing run states.
#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    UnsupportedVersion(u32),
    Tree(TreeError),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Json(err) => write!(f, "failed to (de)serialize run state: {err}"),
            SnapshotError::UnsupportedVersion(version) => {
                write!(f, "unsupported run state schema version {version}")
            }
            SnapshotError::Tree(err) => write!(f, "corrupt tree in run state: {err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SnapshotError::Json(err) => Some(err),
            SnapshotError::Tree(err) => Some(err),
            SnapshotError::UnsupportedVersion(_) => None,
        }
    }
}
