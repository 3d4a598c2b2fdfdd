//! Global configuration for depc
//!
//! Located at `~/.config/depc/config.toml`

use crate::{ConfigError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global depc configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub daemon: DaemonConfig,
    pub repository: RepositoryConfig,
    pub logstash: LogstashConfig,
}

/// Container daemon settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Docker socket path
    pub socket: String,
    /// Deadline for a single daemon call, in seconds
    pub timeout_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket: default_docker_socket(),
            timeout_secs: 60,
        }
    }
}

#[cfg(windows)]
fn default_docker_socket() -> String {
    "//./pipe/docker_engine".to_string()
}

#[cfg(not(windows))]
fn default_docker_socket() -> String {
    "/var/run/docker.sock".to_string()
}

/// Artifact repository settings written into `repoconfig.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub repo_base_url: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            repo_base_url: "https://artifactory.example.com/artifactory/delivery-release"
                .to_string(),
        }
    }
}

/// Log-shipping endpoint written into `repoconfig.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogstashConfig {
    pub host: String,
    pub port: u16,
}

impl Default for LogstashConfig {
    fn default() -> Self {
        Self {
            host: "logstash.example.com".to_string(),
            port: 4242,
        }
    }
}

impl GlobalConfig {
    /// Path to the global config file
    pub fn path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "depc").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load the global config, falling back to defaults when the file is absent
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save the global config
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::WriteError {
                path: path.clone(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(format!("serialize config: {}", e)))?;
        std::fs::write(&path, content)
            .map_err(|source| ConfigError::WriteError { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GlobalConfig::default();
        assert_eq!(config.daemon.timeout_secs, 60);
        assert_eq!(config.logstash.port, 4242);
        assert!(!config.repository.repo_base_url.is_empty());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml = r#"
            [logstash]
            host = "logs.internal"
        "#;
        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.logstash.host, "logs.internal");
        assert_eq!(config.logstash.port, 4242);
        assert_eq!(config.daemon.timeout_secs, 60);
    }

    #[test]
    fn test_load_from_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nope.toml");
        assert!(matches!(
            GlobalConfig::load_from(&path),
            Err(ConfigError::ReadError { .. })
        ));
    }
}
