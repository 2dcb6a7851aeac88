// config.rs - Planner configuration.
//
// PlannerConfig determines where drafts, confirmed actions and the event log
// live, and carries the tunable settings from `.actionplan/config.toml`.
// Every setting has a default, so a missing or partial file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable that overrides `[engine] webhook_url`.
pub const ENGINE_URL_ENV: &str = "ACTIONPLAN_ENGINE_URL";

/// Errors from loading `config.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Settings read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub autosave: AutosaveSettings,

    #[serde(default)]
    pub conversation: ConversationSettings,
}

/// Suggestion engine connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Webhook receiving generate/refine requests.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Whole-request timeout. Engine calls can take a while.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl EngineSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutosaveSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl AutosaveSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSettings {
    /// Most recent entries sent with a refinement request (0 = all).
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_interval_secs() -> u64 {
    30
}

fn default_max_history() -> usize {
    20
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load settings, returning defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Apply an engine URL override, ignoring blank values.
    pub fn with_engine_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.engine.webhook_url = Some(url);
        }
        self
    }
}

/// On-disk layout and settings for one project root.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub project_root: PathBuf,

    /// One JSON file per draft.
    pub drafts_dir: PathBuf,

    /// One JSON file per confirmed action.
    pub actions_dir: PathBuf,

    /// Append-only lifecycle event log.
    pub events_log: PathBuf,

    pub config_file: PathBuf,

    pub settings: Settings,
}

impl PlannerConfig {
    /// Standard `.actionplan/` layout with default settings.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        let root = project_root.as_ref().to_path_buf();
        let data_dir = root.join(".actionplan");
        Self {
            project_root: root,
            drafts_dir: data_dir.join("drafts"),
            actions_dir: data_dir.join("actions"),
            events_log: data_dir.join("events.jsonl"),
            config_file: data_dir.join("config.toml"),
            settings: Settings::default(),
        }
    }

    /// Standard layout plus settings from `config.toml` and the environment.
    pub fn load(project_root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::for_project(project_root);
        config.settings = Settings::load_or_default(&config.config_file)?
            .with_engine_url_override(std::env::var(ENGINE_URL_ENV).ok());
        Ok(config)
    }
}
