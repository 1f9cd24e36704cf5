//! Session state and autosave for Caselab case studies.
//!
//! A learner plays a case study inside a [`SimulationSession`]. The
//! session keeps progress in an in-memory [`StateStore`] and mirrors it to
//! the state resource through a debounced [`PersistenceSync`].
//!
//! # Data flow
//!
//! ```text
//! decision --> StateStore --> notify --> idle window (2 s) --> snapshot
//!                                            |                    |
//!                                  reset on every change    compare with last
//!                                                           written, then PUT
//! ```
//!
//! # Modules
//!
//! - [`config`] -- `caselab-config.yaml` loading into typed structs
//! - [`store`] -- The in-memory state store
//! - [`endpoint`] -- [`StateEndpoint`] seam and [`RemoteError`]
//! - [`http`] -- `reqwest` client for the state resource API
//! - [`sync`] -- Write suppression and the debounce task
//! - [`session`] -- Store plus autosave for one simulation

pub mod config;
pub mod endpoint;
pub mod http;
pub mod session;
pub mod store;
pub mod sync;

// Re-export primary types for convenience.
pub use config::{CaselabConfig, ConfigError, SyncConfig};
pub use endpoint::{RemoteError, StateEndpoint};
pub use http::HttpStateClient;
pub use session::{SessionError, SimulationSession};
pub use store::StateStore;
pub use sync::{PersistenceSync, SaveOutcome, SyncHandle, spawn_debounced};
