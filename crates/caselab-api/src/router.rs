//! Axum router construction for the state resource API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /health` -- liveness probe
/// - `POST /api/simulations` -- start a simulation
/// - `GET /state-resource/{simulation_id}` -- read the snapshot
/// - `PUT /state-resource/{simulation_id}` -- replace the snapshot
///
/// CORS allows any origin so the browser front end can be served from a
/// different host during development.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/simulations", post(handlers::create_simulation))
        .route(
            "/state-resource/{simulation_id}",
            get(handlers::get_state).put(handlers::put_state),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
