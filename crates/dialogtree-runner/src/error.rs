use std::path::PathBuf;

use dialogtree_core::{SearchConfigError, SearchError, SnapshotError, TreeError};
use thiserror::Error;

#[derive(Debug, Error)]
/// Error type for run configuration, scenario loading, checkpoints, and runs.
pub enum RunnerError {
    #[error("failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid run config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    SearchConfig(#[from] SearchConfigError),

    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    #[error("tree inconsistency: {0}")]
    Tree(#[from] TreeError),

    #[error("checkpoint unusable: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("duplicate scenario id '{id}'")]
    DuplicateScenario { id: String },

    #[error("scenario id '{id}' cannot be used as a checkpoint file name")]
    InvalidScenarioId { id: String },

    #[error("unsupported scenario file extension for '{path}'")]
    UnknownFormat { path: PathBuf },

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl RunnerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunnerError::Io {
            path: path.into(),
            source,
        }
    }
}
