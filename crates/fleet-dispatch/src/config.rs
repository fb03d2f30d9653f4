// config.rs — Project layout and settings.
//
// `FleetConfig::for_project()` lays out everything under a `.fleet/`
// directory in the project root. `FleetConfig::load()` additionally reads
// `.fleet/config.toml`; every key in that file is optional.
//
// Example `.fleet/config.toml`:
//
//   log_filter = "fleet_dispatch=debug"
//
//   [store]
//   path = "/var/lib/fleet/fleet.db"
//   busy_timeout_ms = 2000
//
//   [events]
//   enabled = false

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings read from `.fleet/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FleetSettings {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub events: EventSettings,

    /// Tracing filter directive, used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

/// Store backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreSettings {
    /// Database file override (defaults to `.fleet/fleet.db`).
    pub path: Option<PathBuf>,

    /// How long a transaction waits for a competing writer before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Event log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventSettings {
    /// Write lifecycle events to `.fleet/events.jsonl`.
    #[serde(default = "default_events_enabled")]
    pub enabled: bool,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            enabled: default_events_enabled(),
        }
    }
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_events_enabled() -> bool {
    true
}

/// Where the fleet keeps its state, plus the loaded settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Root directory of the project.
    pub project_root: PathBuf,

    /// The `.fleet/` state directory.
    pub fleet_dir: PathBuf,

    /// Path to the settings file.
    pub config_file: PathBuf,

    /// Path to the JSONL event log.
    pub events_log: PathBuf,

    pub settings: FleetSettings,
}

impl FleetConfig {
    /// Standard `.fleet/` layout with default settings.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        let root = project_root.as_ref().to_path_buf();
        let fleet_dir = root.join(".fleet");
        Self {
            project_root: root,
            config_file: fleet_dir.join("config.toml"),
            events_log: fleet_dir.join("events.jsonl"),
            fleet_dir,
            settings: FleetSettings::default(),
        }
    }

    /// Standard layout with settings from `.fleet/config.toml` if present.
    pub fn load(project_root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::for_project(project_root);
        if config.config_file.exists() {
            let content =
                std::fs::read_to_string(&config.config_file).map_err(|source| ConfigError::Read {
                    path: config.config_file.clone(),
                    source,
                })?;
            config.settings = toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: config.config_file.clone(),
                source,
            })?;
        }
        Ok(config)
    }

    /// Database file, honoring the `[store] path` override.
    pub fn db_path(&self) -> PathBuf {
        match &self.settings.store.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.project_root.join(path),
            None => self.fleet_dir.join("fleet.db"),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.settings.store.busy_timeout_ms)
    }
}
