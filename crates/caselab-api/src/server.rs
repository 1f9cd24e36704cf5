//! Listener and lifecycle for the state resource API.
//!
//! The API is one process-wide listener in front of a [`StateRepository`]
//! (in memory or `PostgreSQL`). [`start_server`] binds it and serves until
//! `Ctrl-C`; [`serve_until`] takes any shutdown future so a caller (or a
//! test) decides when to stop. Either way the listener stops accepting
//! first and in-flight `PUT`s finish, so a learner's last autosave is not
//! cut off mid-write.
//!
//! [`StateRepository`]: crate::repository::StateRepository

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Where the state resource API listens.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address, e.g. `0.0.0.0` behind the identity gateway.
    pub host: String,
    /// TCP port; `0` picks a free one.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
        }
    }
}

impl ServerConfig {
    fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                ServerError::Bind(format!("invalid address {}:{}: {e}", self.host, self.port))
            })
    }
}

/// Serve the state resource API until `Ctrl-C`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or taken, and
/// [`ServerError::Serve`] on a fatal I/O error while serving.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    serve_until(listener, state, ctrl_c()).await
}

/// Serve the state resource API on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] on a fatal I/O error.
pub async fn serve_until(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("listener has no address: {e}")))?;
    let storage = state.repository.name();

    info!(%addr, storage, "State resource API listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))?;
    info!(%addr, "State resource API stopped");
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for Ctrl-C; serving until killed");
        std::future::pending::<()>().await;
    }
}

/// Failures of the API listener.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The address was invalid or could not be bound.
    #[error("bind error: {0}")]
    Bind(String),

    /// Serving stopped on an I/O error.
    #[error("serve error: {0}")]
    Serve(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_host_is_a_bind_error() {
        let config = ServerConfig {
            host: String::from("not an address"),
            port: 8080,
        };
        let result = start_server(&config, Arc::new(AppState::in_memory())).await;
        assert!(matches!(result, Err(ServerError::Bind(_))));
    }

    #[tokio::test]
    async fn serve_returns_once_shutdown_resolves() {
        let listener = TcpListener::bind("127.0.0.1:0").await;
        assert!(listener.is_ok());
        let Ok(listener) = listener else { return };

        let state = Arc::new(AppState::in_memory());
        let result = serve_until(listener, state, std::future::ready(())).await;
        assert!(result.is_ok(), "{result:?}");
    }
}
