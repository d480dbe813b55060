// ABOUTME: Application configuration loaded from a TOML file with defaults for every field
// Covers the backend command, request timeout, poll intervals and terminal retry policy

pub mod preferences;

pub use preferences::Preferences;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine a config directory for this platform")]
    NoProjectDirs,

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Program spawned as the backend; it speaks line-delimited JSON on stdio.
    pub command: String,
    pub args: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command: "orca-backend".to_string(),
            args: Vec::new(),
            request_timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub sessions_secs: u64,
    pub liveness_secs: u64,
    pub groups_secs: u64,
    pub issues_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            sessions_secs: 3,
            liveness_secs: 5,
            groups_secs: 10,
            issues_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub max_attach_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub scrollback_lines: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            max_attach_attempts: 3,
            retry_base_delay_ms: 500,
            scrollback_lines: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub sidebar_percent: u16,
    pub tick_rate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            sidebar_percent: 25,
            tick_rate_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub poll: PollConfig,
    pub terminal: TerminalConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    pub fn project_dirs() -> Result<ProjectDirs, ConfigError> {
        ProjectDirs::from("dev", "orca", "orca").ok_or(ConfigError::NoProjectDirs)
    }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_poll_intervals() {
        let config = AppConfig::default();
        assert_eq!(config.poll.sessions_secs, 3);
        assert_eq!(config.poll.liveness_secs, 5);
        assert_eq!(config.poll.groups_secs, 10);
        assert_eq!(config.poll.issues_secs, 30);
        assert_eq!(config.backend.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = AppConfig::parse(
            r#"
            [backend]
            command = "/usr/local/bin/orca-backend"
            args = ["--stdio"]

            [poll]
            sessions_secs = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.command, "/usr/local/bin/orca-backend");
        assert_eq!(config.backend.args, vec!["--stdio".to_string()]);
        assert_eq!(config.backend.request_timeout_secs, 30);
        assert_eq!(config.poll.sessions_secs, 1);
        assert_eq!(config.poll.groups_secs, 10);
        assert_eq!(config.terminal, TerminalConfig::default());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[poll]\nsessions_secs = \"soon\"\n").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
