//! Common types for container providers

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Container ID wrapper
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        if self.0.len() > 12 {
            &self.0[..12]
        } else {
            &self.0
        }
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ContainerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Image ID wrapper
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Image reference usable in a container create call: the id with any
    /// `sha256:` digest prefix stripped
    pub fn reference(&self) -> &str {
        self.0.strip_prefix("sha256:").unwrap_or(&self.0)
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Container provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Docker,
    Podman,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Docker => write!(f, "docker"),
            Self::Podman => write!(f, "podman"),
        }
    }
}

/// One image known to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSummary {
    pub id: ImageId,
    /// `repository:tag` labels carried by the image
    pub repo_tags: Vec<String>,
    /// Creation time, unix seconds
    pub created: i64,
}

/// Configuration for creating a container
#[derive(Debug, Clone, Default)]
pub struct CreateContainerConfig {
    /// Image reference
    pub image: String,
    /// Container name
    pub name: Option<String>,
    /// Entrypoint override
    pub entrypoint: Option<Vec<String>>,
    /// Environment variables
    pub env: HashMap<String, String>,
    /// User to run as (e.g. "0:0")
    pub user: Option<String>,
    /// Bind mounts
    pub mounts: Vec<MountConfig>,
    /// Labels
    pub labels: HashMap<String, String>,
    /// Privileged mode
    pub privileged: bool,
    /// Remove the container from the daemon once it stops
    pub auto_remove: bool,
}

/// Mount configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountConfig {
    /// Mount type (bind, volume, tmpfs)
    pub mount_type: MountType,
    /// Source path or volume name
    pub source: String,
    /// Target path in container
    pub target: String,
    /// Read-only
    pub read_only: bool,
    /// Bind propagation mode (bind mounts only)
    pub propagation: Option<BindPropagation>,
}

/// Mount type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountType {
    Bind,
    Volume,
    Tmpfs,
}

impl std::fmt::Display for MountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bind => write!(f, "bind"),
            Self::Volume => write!(f, "volume"),
            Self::Tmpfs => write!(f, "tmpfs"),
        }
    }
}

/// Bind-mount propagation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindPropagation {
    Private,
    RPrivate,
    Shared,
    RShared,
    Slave,
    RSlave,
}

impl std::fmt::Display for BindPropagation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::RPrivate => write!(f, "rprivate"),
            Self::Shared => write!(f, "shared"),
            Self::RShared => write!(f, "rshared"),
            Self::Slave => write!(f, "slave"),
            Self::RSlave => write!(f, "rslave"),
        }
    }
}

/// Provider information
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub provider_type: ProviderType,
    pub api_version: String,
    pub os: String,
    pub arch: String,
}
