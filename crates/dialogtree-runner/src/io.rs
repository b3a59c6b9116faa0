use std::{collections::HashSet, fs, io::Write, path::Path};

use dialogtree_core::RunState;
use tempfile::NamedTempFile;

use crate::{RunnerError, ScenarioSpec};

/// Load a scenario list from JSON (`.json`) or YAML (`.yaml`, `.yml`).
pub fn load_scenarios(path: impl AsRef<Path>) -> Result<Vec<ScenarioSpec>, RunnerError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|err| RunnerError::io(path, err))?;
    let scenarios: Vec<ScenarioSpec> = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&text)?,
        Some("yaml" | "yml") => serde_yaml::from_str(&text)?,
        _ => {
            return Err(RunnerError::UnknownFormat {
                path: path.to_path_buf(),
            });
        }
    };
    check_scenario_ids(&scenarios)?;
    Ok(scenarios)
}

/// Ids must be unique and usable as file names.
pub fn check_scenario_ids(scenarios: &[ScenarioSpec]) -> Result<(), RunnerError> {
    let mut seen = HashSet::new();
    for scenario in scenarios {
        let id = scenario.id.as_str();
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
            return Err(RunnerError::InvalidScenarioId { id: id.to_string() });
        }
        if !seen.insert(id) {
            return Err(RunnerError::DuplicateScenario { id: id.to_string() });
        }
    }
    Ok(())
}

/// Atomically replace the checkpoint at `path`.
///
/// The state is written to a temporary file in the same directory, synced, and
/// renamed over `path`, so readers only ever see a complete snapshot.
pub fn save_run_state(path: impl AsRef<Path>, state: &RunState) -> Result<(), RunnerError> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|err| RunnerError::io(dir, err))?;

    let json = state.to_json()?;
    let mut file = NamedTempFile::new_in(dir).map_err(|err| RunnerError::io(dir, err))?;
    file.write_all(json.as_bytes())
        .map_err(|err| RunnerError::io(file.path(), err))?;
    file.as_file()
        .sync_all()
        .map_err(|err| RunnerError::io(file.path(), err))?;
    file.persist(path)
        .map_err(|err| RunnerError::io(path, err.error))?;
    Ok(())
}

/// Read and validate a checkpoint.
pub fn load_run_state(path: impl AsRef<Path>) -> Result<RunState, RunnerError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|err| RunnerError::io(path, err))?;
    Ok(RunState::from_json(&json)?)
}
