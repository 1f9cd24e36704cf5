//! Simulation records and their latest state snapshot.
//!
//! `simulations` holds ownership; `simulation_states` holds one row per
//! simulation with the snapshot's three top-level fields as columns.
//! Saving is an upsert that replaces the whole row: there is no version
//! column and the last write wins.

use caselab_types::{
    CaseStudyId, EventLogEntry, Simulation, SimulationId, StateSnapshot, UserId,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::DbError;

/// Operations on the `simulations` and `simulation_states` tables.
pub struct SimulationStore<'a> {
    pool: &'a PgPool,
}

impl<'a> SimulationStore<'a> {
    /// Create a store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Simulations
    // =========================================================================

    /// Insert a new simulation.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert_simulation(&self, simulation: &Simulation) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO simulations (id, owner_id, case_study_id, created_at)
              VALUES ($1, $2, $3, $4)",
        )
        .bind(simulation.id.into_inner())
        .bind(simulation.owner_id.into_inner())
        .bind(simulation.case_study_id.as_str())
        .bind(simulation.created_at)
        .execute(self.pool)
        .await?;

        tracing::debug!(simulation_id = %simulation.id, "Inserted simulation");
        Ok(())
    }

    /// Fetch a simulation by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get_simulation(&self, id: SimulationId) -> Result<Option<Simulation>, DbError> {
        let row = sqlx::query_as::<_, SimulationRow>(
            r"SELECT id, owner_id, case_study_id, created_at
              FROM simulations
              WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Simulation::from))
    }

    // =========================================================================
    // State snapshots
    // =========================================================================

    /// Replace the stored snapshot of a simulation.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the upsert fails, including when
    /// the simulation does not exist (foreign key violation).
    pub async fn upsert_state(
        &self,
        id: SimulationId,
        snapshot: &StateSnapshot,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO simulation_states
                (simulation_id, stage_states, current_stage_id, event_log, updated_at)
              VALUES ($1, $2, $3, $4, now())
              ON CONFLICT (simulation_id) DO UPDATE SET
                stage_states = EXCLUDED.stage_states,
                current_stage_id = EXCLUDED.current_stage_id,
                event_log = EXCLUDED.event_log,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(id.into_inner())
        .bind(Json(&snapshot.stage_states))
        .bind(snapshot.current_stage_id.as_str())
        .bind(Json(&snapshot.event_log))
        .execute(self.pool)
        .await?;

        tracing::debug!(
            simulation_id = %id,
            events = snapshot.event_log.len(),
            "Upserted simulation state"
        );
        Ok(())
    }

    /// Fetch the stored snapshot of a simulation.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails and
    /// [`DbError::Serialization`] if a JSON column is malformed.
    pub async fn get_state(&self, id: SimulationId) -> Result<Option<StateSnapshot>, DbError> {
        let row = sqlx::query_as::<_, StateRow>(
            r"SELECT stage_states, current_stage_id, event_log, updated_at
              FROM simulation_states
              WHERE simulation_id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(StateRow::into_snapshot).transpose()
    }
}

/// A row from the `simulations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SimulationRow {
    /// Simulation id.
    pub id: Uuid,
    /// Owning user id.
    pub owner_id: Uuid,
    /// Case study slug.
    pub case_study_id: String,
    /// When the simulation was started.
    pub created_at: DateTime<Utc>,
}

impl From<SimulationRow> for Simulation {
    fn from(row: SimulationRow) -> Self {
        Self {
            id: SimulationId::from(row.id),
            owner_id: UserId::from(row.owner_id),
            case_study_id: CaseStudyId::from(row.case_study_id),
            created_at: row.created_at,
        }
    }
}

/// A row from the `simulation_states` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StateRow {
    /// Stage payloads keyed by stage id.
    pub stage_states: serde_json::Value,
    /// Current stage id.
    pub current_stage_id: String,
    /// Progress event log.
    pub event_log: serde_json::Value,
    /// When the row was last replaced.
    pub updated_at: DateTime<Utc>,
}

impl StateRow {
    /// Decode the JSON columns into a [`StateSnapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if a column has the wrong shape.
    pub fn into_snapshot(self) -> Result<StateSnapshot, DbError> {
        let stage_states = serde_json::from_value(self.stage_states)?;
        let event_log: Vec<EventLogEntry> = serde_json::from_value(self.event_log)?;
        Ok(StateSnapshot {
            stage_states,
            current_stage_id: self.current_stage_id,
            event_log,
        })
    }
}
