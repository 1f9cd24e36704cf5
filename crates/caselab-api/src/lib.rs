//! State resource API server for Caselab simulations.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`POST /api/simulations`** to start a simulation owned by the caller
//! - **`GET`/`PUT /state-resource/{simulationId}`** to read and replace the
//!   simulation's `{stageStates, currentStageId, eventLog}` snapshot
//! - **`GET /health`** for liveness probes
//!
//! # Architecture
//!
//! Callers are identified by the headers of the identity gateway (see
//! [`identity`]). Only the owner of a simulation can read or write its
//! state; anyone else gets the same 404 as for a missing simulation.
//! Storage is a [`StateRepository`], either in memory or `PostgreSQL`.
//! A `PUT` replaces the snapshot wholesale with no version check, so the
//! last write wins.

pub mod error;
pub mod handlers;
pub mod identity;
pub mod repository;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use repository::{MemoryRepository, StateRepository};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, serve_until, start_server};
pub use state::AppState;
