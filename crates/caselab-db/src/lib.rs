//! `PostgreSQL` data layer for Caselab.
//!
//! ```text
//! state resource API
//!     |
//!     +-- POST /api/simulations --> simulations        (ownership)
//!     +-- GET/PUT state ---------> simulation_states   (latest snapshot)
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool and migrations
//! - [`simulation_store`] -- Simulation and snapshot queries
//! - [`error`] -- Shared error types

pub mod error;
pub mod postgres;
pub mod simulation_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
pub use simulation_store::{SimulationRow, SimulationStore, StateRow};
