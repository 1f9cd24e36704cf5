//! Shared type definitions for Caselab case-study simulations.
//!
//! This crate is the single source of truth for the types exchanged
//! between the player, the state resource API, and the database layer.
//! Wire types flow downstream to `TypeScript` via `ts-rs` for the web
//! front end.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier wrappers (UUID ids and authored string keys)
//! - [`enums`] -- Decision point kinds, transcript roles, progress events
//! - [`case`] -- Read-only case content (decision points, personas)
//! - [`progress`] -- Learner progress and the progress event log
//! - [`snapshot`] -- The `{stageStates, currentStageId, eventLog}` wire body
//! - [`simulation`] -- Simulation records and API request bodies

pub mod case;
pub mod enums;
pub mod ids;
pub mod progress;
pub mod simulation;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use case::{CaseStructure, DecisionPoint, Persona};
pub use enums::{DecisionPointType, ProgressEvent, TranscriptRole};
pub use ids::{CaseStudyId, CompetencyId, DecisionPointId, PersonaId, SimulationId, UserId};
pub use progress::{CaseStudyState, EventLogEntry, RolePlayTurn, UserDecision};
pub use simulation::{
    CreateSimulationRequest, CreatedSimulation, CurrentUser, Simulation, USER_EMAIL_HEADER,
    USER_ID_HEADER,
};
pub use snapshot::{DECISION_POINTS_STAGE, StateSnapshot};
