//! Error types for depc-core

use depc_provider::ProviderError;
use std::path::PathBuf;
use thiserror::Error;

/// Which of the run's two containers an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRole {
    Probe,
    Final,
}

impl std::fmt::Display for ContainerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Probe => write!(f, "probe"),
            Self::Final => write!(f, "final"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] depc_config::ConfigError),

    #[error("No image found matching {0}")]
    ImageNotFound(String),

    #[error("Failed to create {role} container: {source}")]
    ContainerCreateFailed {
        role: ContainerRole,
        source: ProviderError,
    },

    #[error("Failed to remove container {id}: {source}")]
    ContainerRemoveFailed { id: String, source: ProviderError },

    #[error("Failed to start container {id} (left on the daemon for inspection): {source}")]
    ContainerStartFailed { id: String, source: ProviderError },

    #[error("No interactive shell available in image")]
    NoShellAvailable,

    #[error("Failed to copy {path} out of container: {source}")]
    FileCopyFailed {
        path: String,
        source: ProviderError,
    },

    #[error("Failed to write {path}: {source}")]
    FileWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Daemon call '{0}' exceeded its deadline")]
    DaemonTimeout(&'static str),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
