//! A learner's session with one simulation.
//!
//! [`SimulationSession`] owns the session's [`StateStore`] and its
//! debounced [`PersistenceSync`]. Nothing is process-wide: two sessions
//! for the same simulation (two tabs) each hold their own store and
//! overwrite each other's saves, last write wins.

use std::sync::Arc;
use std::time::Duration;

use caselab_types::{CaseStudyState, SimulationId, StateSnapshot, UserDecision};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::endpoint::{RemoteError, StateEndpoint};
use crate::store::StateStore;
use crate::sync::{PersistenceSync, SaveOutcome, SyncHandle, spawn_debounced};

/// Errors that can occur while opening a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The stored state could not be fetched.
    #[error("failed to load state for simulation {simulation_id}: {source}")]
    Load {
        /// The simulation being opened.
        simulation_id: SimulationId,
        /// The endpoint failure.
        source: RemoteError,
    },

    /// The stored state was fetched but is not valid progress.
    #[error("stored state for simulation {simulation_id} is malformed: {source}")]
    Malformed {
        /// The simulation being opened.
        simulation_id: SimulationId,
        /// The decode failure.
        source: serde_json::Error,
    },
}

/// An open simulation: in-memory progress plus its autosave.
pub struct SimulationSession<E: StateEndpoint> {
    simulation_id: SimulationId,
    store: Arc<RwLock<StateStore>>,
    sync: Arc<PersistenceSync<E>>,
    autosave: SyncHandle,
}

impl<E: StateEndpoint> SimulationSession<E> {
    /// Open `simulation_id`, seeding the store from the endpoint.
    ///
    /// A simulation with no stored state starts empty. When state is
    /// found it is recorded as already written, so an untouched resumed
    /// session never saves.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Load`] if the endpoint call fails and
    /// [`SessionError::Malformed`] if the stored state does not decode.
    pub async fn open(
        simulation_id: SimulationId,
        endpoint: Arc<E>,
        idle_window: Duration,
    ) -> Result<Self, SessionError> {
        let loaded = endpoint
            .load(simulation_id)
            .await
            .map_err(|source| SessionError::Load {
                simulation_id,
                source,
            })?;

        let sync = Arc::new(PersistenceSync::new(simulation_id, endpoint));
        let store = match loaded {
            Some(snapshot) => {
                let store = StateStore::from_snapshot(snapshot, Utc::now()).map_err(|source| {
                    SessionError::Malformed {
                        simulation_id,
                        source,
                    }
                })?;
                // Compare future saves against what the store would write,
                // not the stored bytes, which may differ in formatting.
                let rewritten = store.snapshot().map_err(|source| SessionError::Malformed {
                    simulation_id,
                    source,
                })?;
                sync.mark_written(&rewritten).await;
                tracing::info!(
                    %simulation_id,
                    decisions = store.state().decisions.len(),
                    "Resumed simulation"
                );
                store
            }
            None => {
                tracing::info!(%simulation_id, "No stored state; starting fresh");
                StateStore::new(Utc::now())
            }
        };

        Ok(Self::with_store(simulation_id, store, sync, idle_window))
    }

    /// Start a session over an existing store without loading anything.
    pub fn with_store(
        simulation_id: SimulationId,
        store: StateStore,
        sync: Arc<PersistenceSync<E>>,
        idle_window: Duration,
    ) -> Self {
        let store = Arc::new(RwLock::new(store));
        let autosave = spawn_debounced(Arc::clone(&sync), Arc::clone(&store), idle_window);
        Self {
            simulation_id,
            store,
            sync,
            autosave,
        }
    }

    /// The simulation this session edits.
    pub const fn simulation_id(&self) -> SimulationId {
        self.simulation_id
    }

    /// Record a decision and schedule an autosave. Returns the decision's
    /// index.
    pub async fn record_decision(&self, decision: UserDecision) -> usize {
        let index = self.store.write().await.record_decision(decision);
        self.autosave.notify_changed();
        index
    }

    /// Copy of the current progress.
    pub async fn state(&self) -> CaseStudyState {
        self.store.read().await.state().clone()
    }

    /// Copy of the current state in wire form.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the progress cannot be encoded.
    pub async fn snapshot(&self) -> Result<StateSnapshot, serde_json::Error> {
        self.store.read().await.snapshot()
    }

    /// Run `f` against the store under a read lock.
    pub async fn inspect<T>(&self, f: impl FnOnce(&StateStore) -> T) -> T {
        f(&*self.store.read().await)
    }

    /// Save the current state now, bypassing the idle window.
    pub async fn flush(&self) -> SaveOutcome {
        match self.snapshot().await {
            Ok(snapshot) => self.sync.save(&snapshot).await,
            Err(e) => {
                tracing::warn!(
                    simulation_id = %self.simulation_id,
                    error = %e,
                    "Could not snapshot state; flush dropped"
                );
                SaveOutcome::Failed
            }
        }
    }

    /// Tear the session down, dropping any pending autosave.
    ///
    /// Edits made within the last idle window are not saved; use
    /// [`SimulationSession::finish`] to keep them.
    pub fn close(self) {
        self.autosave.cancel();
        tracing::debug!(simulation_id = %self.simulation_id, "Session closed");
    }

    /// Cancel the pending autosave, then save the final state.
    pub async fn finish(self) -> SaveOutcome {
        self.autosave.cancel();
        let outcome = self.flush().await;
        tracing::info!(simulation_id = %self.simulation_id, ?outcome, "Session finished");
        outcome
    }
}
