//! Storage behind the state resource.
//!
//! [`StateRepository`] is either an in-memory map (development and tests)
//! or `PostgreSQL`. Both hold a simulation table and one snapshot per
//! simulation; a save replaces the previous snapshot wholesale.

use std::collections::BTreeMap;

use caselab_db::{DbError, PostgresPool, SimulationStore};
use caselab_types::{Simulation, SimulationId, StateSnapshot, UserId};
use tokio::sync::RwLock;

// ---------------------------------------------------------------------------
// Unified repository enum
// ---------------------------------------------------------------------------

/// Where simulations and their snapshots live.
///
/// Uses enum dispatch instead of trait objects because async methods
/// are not dyn-compatible in Rust.
pub enum StateRepository {
    /// Process-local maps; lost on restart.
    Memory(MemoryRepository),
    /// `PostgreSQL` tables `simulations` and `simulation_states`.
    Postgres(PostgresPool),
}

impl StateRepository {
    /// An empty in-memory repository.
    pub fn in_memory() -> Self {
        Self::Memory(MemoryRepository::default())
    }

    /// Record a new simulation.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database insert fails.
    pub async fn create_simulation(&self, simulation: &Simulation) -> Result<(), DbError> {
        match self {
            Self::Memory(repo) => {
                repo.create_simulation(simulation).await;
                Ok(())
            }
            Self::Postgres(pg) => {
                SimulationStore::new(pg.pool())
                    .insert_simulation(simulation)
                    .await
            }
        }
    }

    /// The simulation `id`, if it exists and belongs to `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database query fails.
    pub async fn owned_simulation(
        &self,
        id: SimulationId,
        owner: UserId,
    ) -> Result<Option<Simulation>, DbError> {
        let simulation = match self {
            Self::Memory(repo) => repo.simulation(id).await,
            Self::Postgres(pg) => SimulationStore::new(pg.pool()).get_simulation(id).await?,
        };
        Ok(simulation.filter(|s| s.owner_id == owner))
    }

    /// The latest stored snapshot of simulation `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or the stored row is malformed.
    pub async fn load_state(&self, id: SimulationId) -> Result<Option<StateSnapshot>, DbError> {
        match self {
            Self::Memory(repo) => Ok(repo.state(id).await),
            Self::Postgres(pg) => SimulationStore::new(pg.pool()).get_state(id).await,
        }
    }

    /// Replace the stored snapshot of simulation `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database upsert fails.
    pub async fn save_state(&self, id: SimulationId, snapshot: &StateSnapshot) -> Result<(), DbError> {
        match self {
            Self::Memory(repo) => {
                repo.save_state(id, snapshot).await;
                Ok(())
            }
            Self::Postgres(pg) => SimulationStore::new(pg.pool()).upsert_state(id, snapshot).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory repository
// ---------------------------------------------------------------------------

/// Simulations and snapshots kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    simulations: RwLock<BTreeMap<SimulationId, Simulation>>,
    states: RwLock<BTreeMap<SimulationId, StateSnapshot>>,
}

impl MemoryRepository {
    async fn create_simulation(&self, simulation: &Simulation) {
        self.simulations
            .write()
            .await
            .insert(simulation.id, simulation.clone());
    }

    async fn simulation(&self, id: SimulationId) -> Option<Simulation> {
        self.simulations.read().await.get(&id).cloned()
    }

    async fn state(&self, id: SimulationId) -> Option<StateSnapshot> {
        self.states.read().await.get(&id).cloned()
    }

    async fn save_state(&self, id: SimulationId, snapshot: &StateSnapshot) {
        self.states.write().await.insert(id, snapshot.clone());
    }
}
