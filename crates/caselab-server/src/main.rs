//! State resource server for Caselab simulations.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `caselab-config.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Connect to `PostgreSQL` and run migrations when a database URL is
//!    configured, otherwise keep state in memory
//! 4. Serve the API until `Ctrl-C`

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use caselab_api::{AppState, ServerConfig, StateRepository};
use caselab_core::CaselabConfig;
use caselab_core::config::LoggingConfig;
use caselab_db::{PostgresConfig, PostgresPool};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::StartupError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "caselab-config.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    let (config, from_file) = load_config(&config_path)?;
    init_logging(&config.logging)?;

    info!("caselab-server starting");
    if from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }

    let repository = open_repository(&config).await?;
    let state = Arc::new(AppState::new(repository));

    let server_config = ServerConfig {
        host: config.http.host.clone(),
        port: config.http.port,
    };
    caselab_api::start_server(&server_config, Arc::clone(&state))
        .await
        .map_err(StartupError::from)?;

    if let StateRepository::Postgres(pg) = &state.repository {
        pg.close().await;
    }
    info!("caselab-server stopped");
    Ok(())
}

/// Load configuration, falling back to defaults when the file is absent.
///
/// Environment overrides apply in both cases.
fn load_config(path: &Path) -> Result<(CaselabConfig, bool), StartupError> {
    if path.exists() {
        Ok((CaselabConfig::from_file(path)?, true))
    } else {
        let mut config = CaselabConfig::default();
        config.apply_env_overrides()?;
        Ok((config, false))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<(), StartupError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| StartupError::Logging {
        message: format!("{e}"),
    })
}

async fn open_repository(config: &CaselabConfig) -> Result<StateRepository, StartupError> {
    let Some(url) = &config.database.url else {
        warn!("No database URL configured; simulation state is kept in memory");
        return Ok(StateRepository::in_memory());
    };

    let pg_config =
        PostgresConfig::new(url).with_max_connections(config.database.max_connections);
    let pool = PostgresPool::connect(&pg_config).await?;
    if config.database.run_migrations {
        pool.run_migrations().await?;
    }
    Ok(StateRepository::Postgres(pool))
}
