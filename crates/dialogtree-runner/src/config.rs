use std::{fs, path::Path, path::PathBuf};

use dialogtree_core::{RetryPolicy, SearchConfig};
use serde::{Deserialize, Serialize};

use crate::{RunLimits, RunnerError};

const DEFAULT_RUN_CONFIG_YAML: &str = include_str!("../config/run.default.yaml");

/// Everything a batch of scenario runs needs besides the scenarios themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub search: SearchConfig,
    pub limits: RunLimits,
    /// Applied to every dialogue callback.
    pub retry: RetryPolicy,
    /// Scenarios searched concurrently.
    pub workers: usize,
    /// One checkpoint file per scenario is kept here.
    pub checkpoint_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            search: SearchConfig::default(),
            limits: RunLimits::default(),
            retry: RetryPolicy::default(),
            workers: 10,
            checkpoint_dir: PathBuf::from("tmp/checkpoints"),
        }
    }
}

impl RunConfig {
    /// Parse a run config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RunnerError> {
        let config: RunConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a run config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, RunnerError> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|err| RunnerError::io(path, err))?;
        Self::from_yaml_str(&yaml)
    }

    /// Return the default YAML config included with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_RUN_CONFIG_YAML
    }

    pub fn from_default_yaml() -> Result<Self, RunnerError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    pub fn validate(&self) -> Result<(), RunnerError> {
        self.search.validate()?;
        self.limits.validate()?;
        if self.workers == 0 {
            return Err(RunnerError::InvalidConfig(
                "workers must be greater than 0".to_string(),
            ));
        }
        if self.retry.max_attempts == Some(0) {
            return Err(RunnerError::InvalidConfig(
                "retry.max_attempts must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Checkpoint file of one scenario.
    pub fn checkpoint_path(&self, scenario_id: &str) -> PathBuf {
        self.checkpoint_dir.join(format!("{scenario_id}.json"))
    }
}
