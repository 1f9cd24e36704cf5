//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `caselab-config.yaml` at the
//! project root. Every section is optional; missing sections and fields
//! fall back to the defaults below.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held an unusable value.
    #[error("invalid environment override {name}: {message}")]
    Env {
        /// The environment variable name.
        name: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `caselab-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CaselabConfig {
    /// HTTP listener for the state resource API.
    #[serde(default)]
    pub http: HttpConfig,

    /// `PostgreSQL` settings. Without a URL the server keeps state in memory.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Autosave timing, read by the player.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CaselabConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `DATABASE_URL` overrides `database.url`
    /// - `CASELAB_PORT` overrides `http.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Env`] if an override cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Env`] if an override cannot be parsed.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a mapping.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Override values with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if `CASELAB_PORT` is not a port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("DATABASE_URL") {
            self.database.url = Some(val);
        }
        if let Ok(val) = std::env::var("CASELAB_PORT") {
            self.http.port = val.parse().map_err(|e| ConfigError::Env {
                name: "CASELAB_PORT",
                message: format!("{e}"),
            })?;
        }
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `PostgreSQL` settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL. `None` selects the in-memory repository.
    #[serde(default)]
    pub url: Option<String>,

    /// Maximum pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Apply pending migrations at startup.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            run_migrations: default_true(),
        }
    }
}

/// Autosave timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SyncConfig {
    /// Quiet period after the last change before a save is attempted.
    #[serde(default = "default_idle_window_ms")]
    pub idle_window_ms: u64,

    /// How long a loaded snapshot may be served from the client cache.
    /// Zero disables the cache.
    #[serde(default = "default_read_stale_after_ms")]
    pub read_stale_after_ms: u64,
}

impl SyncConfig {
    /// The idle window as a [`Duration`].
    pub const fn idle_window(&self) -> Duration {
        Duration::from_millis(self.idle_window_ms)
    }

    /// The read staleness window as a [`Duration`].
    pub const fn read_stale_after(&self) -> Duration {
        Duration::from_millis(self.read_stale_after_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            idle_window_ms: default_idle_window_ms(),
            read_stale_after_ms: default_read_stale_after_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_idle_window_ms() -> u64 {
    2_000
}

const fn default_read_stale_after_ms() -> u64 {
    300_000
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
