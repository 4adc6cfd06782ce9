use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::domain::scenario::{NewScenario, ScenarioPayload, ScenarioValidationError};
use crate::domain::simulation_result::SimulationResult;

#[derive(Error, Debug)]
pub enum ScenarioFileError {
    #[error("failed to read scenario file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse scenario file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid scenario in {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: ScenarioValidationError,
    },
}

/// Loads a scenario from a YAML file. JSON files work too, JSON being valid YAML.
pub fn load_scenario_from_yaml_file(filepath: &str) -> Result<NewScenario, ScenarioFileError> {
    let path = PathBuf::from(filepath);
    let contents = std::fs::read_to_string(&path).map_err(|source| ScenarioFileError::Read {
        path: path.clone(),
        source,
    })?;
    let payload: ScenarioPayload =
        serde_yaml::from_str(&contents).map_err(|source| ScenarioFileError::Parse {
            path: path.clone(),
            source,
        })?;
    payload
        .validate()
        .map_err(|source| ScenarioFileError::Invalid { path, source })
}

#[derive(Serialize)]
struct SimulationRecord<'a> {
    scenario_name: &'a str,
    result: &'a SimulationResult,
}

pub fn serialize_simulation_to_yaml(
    scenario_name: &str,
    result: &SimulationResult,
) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&SimulationRecord {
        scenario_name,
        result,
    })
}
