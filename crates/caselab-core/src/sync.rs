//! Debounced persistence of session state.
//!
//! [`PersistenceSync`] pushes full snapshots to a [`StateEndpoint`] and
//! skips any snapshot whose serialization is byte-identical to the last
//! one written successfully. [`spawn_debounced`] runs it behind a timer:
//! every change notification restarts an idle window, and only when the
//! window elapses without further changes is the store read and saved.
//!
//! Failed saves are logged and dropped. The written marker is left alone
//! on failure, so the next change after recovery is saved even if it
//! serializes to the same bytes as the failed attempt. Nothing retries
//! on its own.

use std::sync::Arc;
use std::time::Duration;

use caselab_types::{SimulationId, StateSnapshot};
use tokio::sync::{Mutex, RwLock, watch};
use tokio_util::sync::CancellationToken;

use crate::endpoint::StateEndpoint;
use crate::store::StateStore;

/// Result of a single save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The snapshot was written to the endpoint.
    Written,
    /// Identical to the last written snapshot; no request was made.
    Suppressed,
    /// The endpoint call failed; the snapshot was dropped.
    Failed,
}

/// Writes snapshots of one simulation through to a state endpoint.
///
/// Saves through one sync are serialized: at most one request is in
/// flight at a time, and a save waiting behind it compares against the
/// marker that request leaves.
pub struct PersistenceSync<E> {
    simulation_id: SimulationId,
    endpoint: Arc<E>,
    last_written: Mutex<Option<String>>,
}

impl<E: StateEndpoint> PersistenceSync<E> {
    /// Create a sync for `simulation_id` with no write recorded yet.
    pub fn new(simulation_id: SimulationId, endpoint: Arc<E>) -> Self {
        Self {
            simulation_id,
            endpoint,
            last_written: Mutex::new(None),
        }
    }

    /// The simulation this sync writes to.
    pub const fn simulation_id(&self) -> SimulationId {
        self.simulation_id
    }

    /// Record `snapshot` as already present on the endpoint, e.g. right
    /// after loading it, so saving it unchanged is suppressed.
    pub async fn mark_written(&self, snapshot: &StateSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(serialized) => *self.last_written.lock().await = Some(serialized),
            Err(e) => tracing::warn!(error = %e, "Could not serialize loaded snapshot"),
        }
    }

    /// Save `snapshot` unless it matches the last successful write.
    ///
    /// Never returns an error: failures are logged and reported as
    /// [`SaveOutcome::Failed`].
    pub async fn save(&self, snapshot: &StateSnapshot) -> SaveOutcome {
        let simulation_id = self.simulation_id;
        let serialized = match serde_json::to_string(snapshot) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::warn!(%simulation_id, error = %e, "Could not serialize snapshot; save dropped");
                return SaveOutcome::Failed;
            }
        };

        // Held across the write: a concurrent save of the same bytes waits
        // here and is then suppressed.
        let mut last_written = self.last_written.lock().await;
        if last_written.as_deref() == Some(serialized.as_str()) {
            tracing::debug!(%simulation_id, "Snapshot unchanged since last write; save suppressed");
            return SaveOutcome::Suppressed;
        }

        match self.endpoint.save(simulation_id, snapshot).await {
            Ok(()) => {
                tracing::debug!(%simulation_id, bytes = serialized.len(), "Snapshot saved");
                *last_written = Some(serialized);
                SaveOutcome::Written
            }
            Err(e) => {
                tracing::warn!(
                    %simulation_id,
                    error = %e,
                    "Snapshot save failed; dropped until the next change"
                );
                SaveOutcome::Failed
            }
        }
    }
}

/// Handle to a running debounce task.
///
/// Dropping the handle (or calling [`SyncHandle::cancel`]) cancels the
/// pending timer. A save that has already started is not cancelled.
pub struct SyncHandle {
    changes: watch::Sender<u64>,
    cancel: CancellationToken,
}

impl SyncHandle {
    /// Signal that the store changed, restarting the idle window.
    pub fn notify_changed(&self) {
        self.changes
            .send_modify(|revision| *revision = revision.wrapping_add(1));
    }

    /// Cancel the pending timer and stop observing changes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn the debounce task for `store`.
///
/// After each [`SyncHandle::notify_changed`] the task waits for
/// `idle_window` with no further notifications, then snapshots the store
/// (at fire time, not at notification time) and hands the snapshot to
/// [`PersistenceSync::save`] on a detached task.
pub fn spawn_debounced<E: StateEndpoint>(
    sync: Arc<PersistenceSync<E>>,
    store: Arc<RwLock<StateStore>>,
    idle_window: Duration,
) -> SyncHandle {
    let (changes, receiver) = watch::channel(0_u64);
    let cancel = CancellationToken::new();
    tokio::spawn(debounce_loop(
        sync,
        store,
        idle_window,
        receiver,
        cancel.clone(),
    ));

    SyncHandle { changes, cancel }
}

async fn debounce_loop<E: StateEndpoint>(
    sync: Arc<PersistenceSync<E>>,
    store: Arc<RwLock<StateStore>>,
    idle_window: Duration,
    mut changes: watch::Receiver<u64>,
    cancel: CancellationToken,
) {
    let simulation_id = sync.simulation_id();
    loop {
        // Idle: wait for the first change.
        tokio::select! {
            () = cancel.cancelled() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        // Pending: every further change restarts the window.
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::debug!(%simulation_id, "Pending save cancelled");
                    return;
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                () = tokio::time::sleep(idle_window) => break,
            }
        }

        let snapshot = match store.read().await.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(%simulation_id, error = %e, "Could not snapshot state; save dropped");
                continue;
            }
        };
        let sync = Arc::clone(&sync);
        tokio::spawn(async move {
            sync.save(&snapshot).await;
        });
    }
    tracing::debug!(%simulation_id, "Debounce task stopped");
}
