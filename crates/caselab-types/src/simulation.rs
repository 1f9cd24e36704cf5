//! Simulation records and the request/response bodies around them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{CaseStudyId, SimulationId, UserId};

/// Header carrying the caller's user id, set by the identity gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the caller's email, set by the identity gateway.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// A learner's run through a case study, owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Simulation {
    /// Simulation identifier.
    pub id: SimulationId,
    /// The only user allowed to read or write this simulation's state.
    pub owner_id: UserId,
    /// Case study being played.
    pub case_study_id: CaseStudyId,
    /// When the simulation was started.
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/simulations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CreateSimulationRequest {
    /// Case study to start.
    pub case_study_id: CaseStudyId,
}

/// Response of `POST /api/simulations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CreatedSimulation {
    /// Identifier of the new simulation.
    pub simulation_id: SimulationId,
    /// Case study being played.
    pub case_study_id: CaseStudyId,
    /// When the simulation was started.
    pub created_at: DateTime<Utc>,
}

impl From<&Simulation> for CreatedSimulation {
    fn from(simulation: &Simulation) -> Self {
        Self {
            simulation_id: simulation.id,
            case_study_id: simulation.case_study_id.clone(),
            created_at: simulation.created_at,
        }
    }
}

/// The signed-in user, as resolved from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User identifier.
    pub id: UserId,
    /// Email address, when the provider shares it.
    pub email: Option<String>,
}
