//! Configuration types for the player.
//!
//! Autosave timing comes from the `sync` section of `caselab-config.yaml`
//! (the same file the server reads), and everything else from environment
//! variables. Environment variables win over the file.

use std::path::Path;
use std::time::Duration;

use caselab_core::{CaselabConfig, SyncConfig};
use caselab_types::{CurrentUser, UserId};

use crate::error::PlayerError;

/// Default state resource URL.
const DEFAULT_ENDPOINT_URL: &str = "http://localhost:8080";

/// Config file read when `CASELAB_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "caselab-config.yaml";

/// Complete player configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Base URL of the state resource API.
    pub endpoint_url: String,
    /// The learner, sent to the API as gateway identity headers.
    pub user: CurrentUser,
    /// Quiet period after the last change before an autosave.
    pub idle_window: Duration,
    /// How long a loaded snapshot may be reused.
    pub read_stale_after: Duration,
    /// Directory with template overrides, if any.
    pub templates_dir: Option<String>,
}

impl PlayerConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Required variables:
    /// - `CASELAB_USER_ID` -- the learner's user id (UUID)
    ///
    /// Optional variables:
    /// - `CASELAB_CONFIG` -- config file path (default `caselab-config.yaml`)
    /// - `CASELAB_ENDPOINT_URL` -- API base URL (default `http://localhost:8080`)
    /// - `CASELAB_USER_EMAIL` -- the learner's email
    /// - `CASELAB_IDLE_WINDOW_MS` -- overrides `sync.idle_window_ms`
    /// - `CASELAB_READ_STALE_AFTER_MS` -- overrides `sync.read_stale_after_ms`
    /// - `CASELAB_TEMPLATES_DIR` -- template override directory
    pub fn from_env() -> Result<Self, PlayerError> {
        let lookup = |name: &str| std::env::var(name).ok();
        let path = lookup("CASELAB_CONFIG").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
        let sync = load_sync_config(Path::new(&path))?;
        Self::from_lookup(lookup, sync)
    }

    /// Load configuration through an arbitrary variable lookup, starting
    /// from the given autosave timing.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        sync: SyncConfig,
    ) -> Result<Self, PlayerError> {
        let user_id: UserId = lookup("CASELAB_USER_ID")
            .ok_or_else(|| {
                PlayerError::Config(String::from("missing required env var CASELAB_USER_ID"))
            })?
            .trim()
            .parse()
            .map_err(|e| PlayerError::Config(format!("invalid CASELAB_USER_ID: {e}")))?;

        let email = lookup("CASELAB_USER_EMAIL").filter(|e| !e.trim().is_empty());

        let endpoint_url =
            lookup("CASELAB_ENDPOINT_URL").unwrap_or_else(|| DEFAULT_ENDPOINT_URL.to_owned());

        let idle_window_ms =
            millis_override(&lookup, "CASELAB_IDLE_WINDOW_MS", sync.idle_window_ms)?;
        let read_stale_after_ms = millis_override(
            &lookup,
            "CASELAB_READ_STALE_AFTER_MS",
            sync.read_stale_after_ms,
        )?;

        Ok(Self {
            endpoint_url,
            user: CurrentUser { id: user_id, email },
            idle_window: Duration::from_millis(idle_window_ms),
            read_stale_after: Duration::from_millis(read_stale_after_ms),
            templates_dir: lookup("CASELAB_TEMPLATES_DIR"),
        })
    }
}

/// The `sync` section of the config file at `path`, or the defaults when
/// there is no such file.
fn load_sync_config(path: &Path) -> Result<SyncConfig, PlayerError> {
    if !path.exists() {
        return Ok(SyncConfig::default());
    }
    CaselabConfig::from_file(path)
        .map(|config| config.sync)
        .map_err(|e| PlayerError::Config(format!("failed to load {}: {e}", path.display())))
}

fn millis_override(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    fallback: u64,
) -> Result<u64, PlayerError> {
    lookup(name)
        .map_or(Ok(fallback), |v| v.trim().parse())
        .map_err(|e| PlayerError::Config(format!("invalid {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = PlayerConfig::from_lookup(
            lookup_from(&[("CASELAB_USER_ID", "01945c2a-3b4f-7def-8a12-bc34567890ab")]),
            SyncConfig::default(),
        );
        assert!(config.is_ok());
        let Ok(config) = config else { return };

        assert_eq!(config.endpoint_url, "http://localhost:8080");
        assert_eq!(config.idle_window, Duration::from_millis(2_000));
        assert_eq!(config.read_stale_after, Duration::from_secs(300));
        assert!(config.user.email.is_none());
        assert!(config.templates_dir.is_none());
    }

    #[test]
    fn overrides_apply() {
        let config = PlayerConfig::from_lookup(lookup_from(&[
            ("CASELAB_USER_ID", "01945c2a-3b4f-7def-8a12-bc34567890ab"),
            ("CASELAB_USER_EMAIL", "ana@example.org"),
            ("CASELAB_ENDPOINT_URL", "https://cases.example.org"),
            ("CASELAB_IDLE_WINDOW_MS", "500"),
            ("CASELAB_READ_STALE_AFTER_MS", "0"),
            ("CASELAB_TEMPLATES_DIR", "my-templates"),
        ]), SyncConfig::default());
        assert!(config.is_ok(), "{config:?}");
        let Ok(config) = config else { return };

        assert_eq!(config.endpoint_url, "https://cases.example.org");
        assert_eq!(config.idle_window, Duration::from_millis(500));
        assert_eq!(config.read_stale_after, Duration::ZERO);
        assert_eq!(config.user.email.as_deref(), Some("ana@example.org"));
        assert_eq!(config.templates_dir.as_deref(), Some("my-templates"));
    }

    #[test]
    fn missing_user_is_an_error() {
        let config = PlayerConfig::from_lookup(lookup_from(&[]), SyncConfig::default());
        assert!(matches!(config, Err(PlayerError::Config(_))));
    }

    #[test]
    fn malformed_values_are_errors() {
        let bad_user = PlayerConfig::from_lookup(
            lookup_from(&[("CASELAB_USER_ID", "ana")]),
            SyncConfig::default(),
        );
        assert!(matches!(bad_user, Err(PlayerError::Config(_))));

        let bad_window = PlayerConfig::from_lookup(lookup_from(&[
            ("CASELAB_USER_ID", "01945c2a-3b4f-7def-8a12-bc34567890ab"),
            ("CASELAB_IDLE_WINDOW_MS", "soon"),
        ]), SyncConfig::default());
        assert!(matches!(bad_window, Err(PlayerError::Config(_))));

        let bad_staleness = PlayerConfig::from_lookup(lookup_from(&[
            ("CASELAB_USER_ID", "01945c2a-3b4f-7def-8a12-bc34567890ab"),
            ("CASELAB_READ_STALE_AFTER_MS", "-1"),
        ]), SyncConfig::default());
        assert!(matches!(bad_staleness, Err(PlayerError::Config(_))));
    }

    #[test]
    fn file_sync_section_is_the_baseline() {
        let sync = SyncConfig {
            idle_window_ms: 750,
            read_stale_after_ms: 10_000,
        };
        let user = ("CASELAB_USER_ID", "01945c2a-3b4f-7def-8a12-bc34567890ab");

        let config = PlayerConfig::from_lookup(lookup_from(&[user]), sync);
        assert!(config.is_ok(), "{config:?}");
        let Ok(config) = config else { return };
        assert_eq!(config.idle_window, Duration::from_millis(750));
        assert_eq!(config.read_stale_after, Duration::from_secs(10));

        let overridden = PlayerConfig::from_lookup(
            lookup_from(&[user, ("CASELAB_IDLE_WINDOW_MS", "100")]),
            sync,
        );
        let Ok(overridden) = overridden else { return };
        assert_eq!(overridden.idle_window, Duration::from_millis(100));
        assert_eq!(overridden.read_stale_after, Duration::from_secs(10));
    }

    #[test]
    fn sync_section_loads_from_file() {
        let path = std::env::temp_dir().join(format!(
            "caselab_player_config_{}.yaml",
            std::process::id()
        ));
        std::fs::write(&path, "sync:\n  idle_window_ms: 1234\n").ok();
        let sync = load_sync_config(&path);
        std::fs::remove_file(&path).ok();

        assert!(sync.is_ok(), "{sync:?}");
        let Ok(sync) = sync else { return };
        assert_eq!(sync.idle_window_ms, 1234);
        assert_eq!(sync.read_stale_after_ms, SyncConfig::default().read_stale_after_ms);
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let sync = load_sync_config(Path::new("definitely/not/here.yaml"));
        assert!(matches!(sync, Ok(s) if s == SyncConfig::default()));
    }
}
