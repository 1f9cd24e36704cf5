//! Shared application state for the API server.

use crate::repository::StateRepository;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
pub struct AppState {
    /// Simulations and their snapshots.
    pub repository: StateRepository,
}

impl AppState {
    /// Create application state over the given repository.
    pub const fn new(repository: StateRepository) -> Self {
        Self { repository }
    }

    /// Create application state backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(StateRepository::in_memory())
    }
}
