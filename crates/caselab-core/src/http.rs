//! HTTP client for the state resource API.
//!
//! Talks to `GET`/`PUT /state-resource/{simulationId}` and
//! `POST /api/simulations` over `reqwest`, identifying the caller with the
//! identity gateway headers. Loads are cached per simulation for a
//! configurable staleness window; a successful save refreshes the cached
//! entry so a later load sees what was written.

use std::collections::BTreeMap;
use std::time::Duration;

use caselab_types::{
    CaseStudyId, CreateSimulationRequest, CreatedSimulation, CurrentUser, SimulationId,
    StateSnapshot, USER_EMAIL_HEADER, USER_ID_HEADER,
};
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::endpoint::{RemoteError, StateEndpoint};

/// A snapshot held in the read cache.
#[derive(Debug, Clone)]
struct CachedSnapshot {
    snapshot: StateSnapshot,
    fetched_at: Instant,
}

/// State resource client.
pub struct HttpStateClient {
    client: reqwest::Client,
    base_url: String,
    user: CurrentUser,
    stale_after: Duration,
    cache: Mutex<BTreeMap<SimulationId, CachedSnapshot>>,
}

impl HttpStateClient {
    /// Create a client for the API at `base_url`, acting as `user`.
    ///
    /// `stale_after` bounds how long a loaded snapshot is served from the
    /// cache; [`Duration::ZERO`] disables caching.
    pub fn new(base_url: &str, user: CurrentUser, stale_after: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            user,
            stale_after,
            cache: Mutex::new(BTreeMap::new()),
        }
    }

    /// Start a new simulation of `case_study_id` owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the request fails or is refused.
    pub async fn create_simulation(
        &self,
        case_study_id: &CaseStudyId,
    ) -> Result<CreatedSimulation, RemoteError> {
        let url = format!("{}/api/simulations", self.base_url);
        let body = CreateSimulationRequest {
            case_study_id: case_study_id.clone(),
        };

        let response = self
            .with_identity(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(format!("POST {url} failed: {e}")))?;

        let response = ensure_success(response).await?;
        response
            .json::<CreatedSimulation>()
            .await
            .map_err(|e| RemoteError::Decode(format!("simulation response: {e}")))
    }

    fn state_url(&self, simulation_id: SimulationId) -> String {
        format!("{}/state-resource/{simulation_id}", self.base_url)
    }

    fn with_identity(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header(USER_ID_HEADER, self.user.id.to_string());
        match &self.user.email {
            Some(email) => request.header(USER_EMAIL_HEADER, email),
            None => request,
        }
    }

    async fn cached(&self, simulation_id: SimulationId) -> Option<StateSnapshot> {
        if self.stale_after.is_zero() {
            return None;
        }
        let cache = self.cache.lock().await;
        cache
            .get(&simulation_id)
            .filter(|entry| entry.fetched_at.elapsed() < self.stale_after)
            .map(|entry| entry.snapshot.clone())
    }

    async fn remember(&self, simulation_id: SimulationId, snapshot: Option<&StateSnapshot>) {
        if self.stale_after.is_zero() {
            return;
        }
        let mut cache = self.cache.lock().await;
        match snapshot {
            Some(snapshot) => {
                cache.insert(
                    simulation_id,
                    CachedSnapshot {
                        snapshot: snapshot.clone(),
                        fetched_at: Instant::now(),
                    },
                );
            }
            None => {
                cache.remove(&simulation_id);
            }
        }
    }
}

impl StateEndpoint for HttpStateClient {
    async fn load(&self, simulation_id: SimulationId) -> Result<Option<StateSnapshot>, RemoteError> {
        if let Some(snapshot) = self.cached(simulation_id).await {
            tracing::debug!(%simulation_id, "State served from read cache");
            return Ok(Some(snapshot));
        }

        let url = self.state_url(simulation_id);
        let response = self
            .with_identity(self.client.get(&url))
            .send()
            .await
            .map_err(|e| RemoteError::Transport(format!("GET {url} failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            self.remember(simulation_id, None).await;
            return Ok(None);
        }

        let response = ensure_success(response).await?;
        let snapshot: StateSnapshot = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(format!("state snapshot: {e}")))?;

        self.remember(simulation_id, Some(&snapshot)).await;
        Ok(Some(snapshot))
    }

    async fn save(
        &self,
        simulation_id: SimulationId,
        snapshot: &StateSnapshot,
    ) -> Result<(), RemoteError> {
        let url = self.state_url(simulation_id);
        let response = self
            .with_identity(self.client.put(&url))
            .json(snapshot)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(format!("PUT {url} failed: {e}")))?;

        ensure_success(response).await?;
        self.remember(simulation_id, Some(snapshot)).await;
        Ok(())
    }
}

/// Turn a non-success response into [`RemoteError::Status`].
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read error body".to_owned());
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}
