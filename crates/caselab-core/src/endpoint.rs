//! The remote state resource as seen by a session.
//!
//! [`StateEndpoint`] is the seam between the session and wherever state
//! is persisted: the HTTP client in production, recording doubles in
//! tests. Futures are required to be `Send` so saves can run on detached
//! Tokio tasks.

use std::future::Future;

use caselab_types::{SimulationId, StateSnapshot};

/// Errors returned by a state endpoint.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for the log.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Read and full-replace access to the state resource.
pub trait StateEndpoint: Send + Sync + 'static {
    /// Fetch the stored snapshot. `Ok(None)` means not found (missing or
    /// not owned by the caller).
    fn load(
        &self,
        simulation_id: SimulationId,
    ) -> impl Future<Output = Result<Option<StateSnapshot>, RemoteError>> + Send;

    /// Replace the stored snapshot wholesale. Last write wins.
    fn save(
        &self,
        simulation_id: SimulationId,
        snapshot: &StateSnapshot,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
