use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::domain::scenario::{NewScenario, Scenario, ScenarioInput, ScenarioSummary};
use crate::services::scenario_store::{ScenarioStore, ScenarioStoreError};

const CREATE_SCENARIOS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS scenarios (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scenario_name TEXT NOT NULL,
    monthly_invoice_volume REAL NOT NULL,
    num_ap_staff REAL NOT NULL,
    avg_hours_per_invoice REAL NOT NULL,
    hourly_wage REAL NOT NULL,
    error_rate_manual REAL NOT NULL,
    error_cost REAL NOT NULL,
    time_horizon_months REAL NOT NULL,
    one_time_implementation_cost REAL NOT NULL DEFAULT 0
);";

/// SQLite-backed [`ScenarioStore`].
///
/// The connection lives behind a mutex so one store handle can be shared
/// between request handlers; SQLite's own locking covers other processes.
pub struct SqliteScenarioStore {
    conn: Mutex<Connection>,
}

impl SqliteScenarioStore {
    /// Opens (or creates) the database at `path`. Writers blocked by another
    /// connection wait up to `busy_timeout` before failing.
    pub fn open<P: AsRef<Path>>(
        path: P,
        busy_timeout: Duration,
    ) -> Result<Self, ScenarioStoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(busy_timeout)?;
        info!(path = %path.as_ref().display(), "opened scenario database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self, ScenarioStoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates the `scenarios` table if it does not exist yet.
    pub fn migrate(&self) -> Result<(), ScenarioStoreError> {
        self.lock()?.execute_batch(CREATE_SCENARIOS_TABLE)?;
        Ok(())
    }

    /// Closes the underlying connection, reporting any error SQLite raises
    /// while finalizing it.
    pub fn close(self) -> Result<(), ScenarioStoreError> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| ScenarioStoreError::Poisoned)?;
        conn.close().map_err(|(_, err)| ScenarioStoreError::Database(err))?;
        info!("closed scenario database");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, ScenarioStoreError> {
        self.conn.lock().map_err(|_| ScenarioStoreError::Poisoned)
    }
}

impl ScenarioStore for SqliteScenarioStore {
    fn create(&self, scenario: &NewScenario) -> Result<i64, ScenarioStoreError> {
        let conn = self.lock()?;
        let input = &scenario.input;
        conn.execute(
            "INSERT INTO scenarios (
                scenario_name, monthly_invoice_volume, num_ap_staff, avg_hours_per_invoice,
                hourly_wage, error_rate_manual, error_cost, time_horizon_months,
                one_time_implementation_cost
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                scenario.scenario_name,
                input.monthly_invoice_volume,
                input.num_ap_staff,
                input.avg_hours_per_invoice,
                input.hourly_wage,
                input.error_rate_manual,
                input.error_cost,
                input.time_horizon_months,
                input.one_time_implementation_cost,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, name = %scenario.scenario_name, "scenario created");
        Ok(id)
    }

    fn list(&self) -> Result<Vec<ScenarioSummary>, ScenarioStoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, scenario_name FROM scenarios ORDER BY id ASC")?;
        let summaries = stmt
            .query_map([], |row| {
                Ok(ScenarioSummary {
                    id: row.get(0)?,
                    scenario_name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    fn get(&self, id: i64) -> Result<Option<Scenario>, ScenarioStoreError> {
        let conn = self.lock()?;
        let scenario = conn
            .query_row(
                "SELECT id, scenario_name, monthly_invoice_volume, num_ap_staff,
                        avg_hours_per_invoice, hourly_wage, error_rate_manual, error_cost,
                        time_horizon_months, one_time_implementation_cost
                 FROM scenarios WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Scenario {
                        id: row.get(0)?,
                        scenario_name: row.get(1)?,
                        input: ScenarioInput {
                            monthly_invoice_volume: row.get(2)?,
                            num_ap_staff: row.get(3)?,
                            avg_hours_per_invoice: row.get(4)?,
                            hourly_wage: row.get(5)?,
                            error_rate_manual: row.get(6)?,
                            error_cost: row.get(7)?,
                            time_horizon_months: row.get(8)?,
                            one_time_implementation_cost: row.get(9)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(scenario)
    }

    fn delete(&self, id: i64) -> Result<bool, ScenarioStoreError> {
        let removed = self
            .lock()?
            .execute("DELETE FROM scenarios WHERE id = ?1", params![id])?;
        debug!(id, removed, "scenario delete");
        Ok(removed > 0)
    }
}
