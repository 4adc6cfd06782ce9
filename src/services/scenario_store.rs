use crate::domain::scenario::{NewScenario, Scenario, ScenarioSummary};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioStoreError {
    #[error("{0}")]
    Database(#[from] rusqlite::Error),
    #[error("scenario store connection is poisoned")]
    Poisoned,
}

/// Describes the persistence contract for saved scenarios.
///
/// Scenarios are never updated in place: they are created, read, listed and
/// deleted.
pub trait ScenarioStore: Send + Sync {
    /// Persists `scenario` and returns its newly assigned id.
    fn create(&self, scenario: &NewScenario) -> Result<i64, ScenarioStoreError>;

    /// Returns every stored scenario as an (id, name) pair, ordered by id.
    fn list(&self) -> Result<Vec<ScenarioSummary>, ScenarioStoreError>;

    fn get(&self, id: i64) -> Result<Option<Scenario>, ScenarioStoreError>;

    /// Removes the scenario if present. Returns whether a row was removed.
    fn delete(&self, id: i64) -> Result<bool, ScenarioStoreError>;
}
