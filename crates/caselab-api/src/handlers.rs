//! REST endpoint handlers for the state resource API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness probe |
//! | `POST` | `/api/simulations` | Start a simulation owned by the caller |
//! | `GET` | `/state-resource/{simulationId}` | Latest snapshot |
//! | `PUT` | `/state-resource/{simulationId}` | Replace the snapshot |
//!
//! Every route except `/health` requires a caller identity. A simulation
//! owned by someone else is reported exactly like a missing one. Bodies
//! are decoded after the identity and ownership checks, and a malformed
//! body gets the same JSON error shape as every other failure.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use caselab_types::{
    CreateSimulationRequest, CreatedSimulation, CurrentUser, Simulation, SimulationId,
    StateSnapshot,
};
use chrono::Utc;

use crate::error::ApiError;
use crate::identity::Authenticated;
use crate::state::AppState;

/// Liveness probe.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "storage": state.repository.name(),
    }))
}

/// Start a new simulation owned by the caller.
pub async fn create_simulation(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    body: Result<Json<CreateSimulationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedSimulation>), ApiError> {
    let Json(request) = body?;
    let simulation = Simulation {
        id: SimulationId::new(),
        owner_id: user.id,
        case_study_id: request.case_study_id,
        created_at: Utc::now(),
    };
    state.repository.create_simulation(&simulation).await?;

    tracing::info!(
        simulation_id = %simulation.id,
        owner_id = %simulation.owner_id,
        case_study_id = %simulation.case_study_id,
        "Simulation created"
    );
    Ok((StatusCode::CREATED, Json(CreatedSimulation::from(&simulation))))
}

/// Return the latest snapshot of a simulation.
pub async fn get_state(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id_str): Path<String>,
) -> Result<Json<StateSnapshot>, ApiError> {
    let id = parse_simulation_id(&id_str)?;
    require_owned(&state, id, &user).await?;

    let snapshot = state
        .repository
        .load_state(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no state stored for simulation {id}")))?;

    tracing::debug!(simulation_id = %id, events = snapshot.event_log.len(), "State read");
    Ok(Json(snapshot))
}

/// Replace the snapshot of a simulation.
pub async fn put_state(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    Path(id_str): Path<String>,
    body: Result<Json<StateSnapshot>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_simulation_id(&id_str)?;
    require_owned(&state, id, &user).await?;
    let Json(snapshot) = body?;

    state.repository.save_state(id, &snapshot).await?;

    tracing::debug!(simulation_id = %id, events = snapshot.event_log.len(), "State replaced");
    Ok(StatusCode::NO_CONTENT)
}

async fn require_owned(
    state: &AppState,
    id: SimulationId,
    user: &CurrentUser,
) -> Result<Simulation, ApiError> {
    state
        .repository
        .owned_simulation(id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("simulation {id} not found")))
}

fn parse_simulation_id(s: &str) -> Result<SimulationId, ApiError> {
    s.parse::<SimulationId>()
        .map_err(|e| ApiError::InvalidUuid(format!("{s}: {e}")))
}
