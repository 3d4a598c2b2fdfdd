//! Container daemon abstraction for depc
//!
//! This crate provides an abstraction over the Docker-compatible control
//! plane with the small set of operations the provisioning pipeline needs:
//! image enumeration, container create/start/remove, an in-container path
//! stat, and copying single files out of a container.

mod docker;
mod error;
mod types;

pub use docker::DockerProvider;
pub use error::*;
pub use types::*;

use async_trait::async_trait;
use std::path::Path;

/// Trait for container providers (Docker, or Podman over the compat API)
#[async_trait]
pub trait ContainerProvider: Send + Sync {
    /// Check if the provider is available/connected
    async fn ping(&self) -> Result<()>;

    /// Enumerate all images known to the daemon
    async fn list_images(&self) -> Result<Vec<ImageSummary>>;

    /// Create a container from an image
    async fn create(&self, config: &CreateContainerConfig) -> Result<ContainerId>;

    /// Start a container
    async fn start(&self, id: &ContainerId) -> Result<()>;

    /// Remove a container
    async fn remove(&self, id: &ContainerId, force: bool) -> Result<()>;

    /// Check whether a path exists inside a created container's filesystem,
    /// without executing anything in it
    async fn stat_path(&self, id: &ContainerId, path: &str) -> Result<bool>;

    /// Copy a single file out of a container to a host path
    async fn copy_file_from(&self, id: &ContainerId, src: &str, dest: &Path) -> Result<()>;

    /// Get provider information
    fn info(&self) -> ProviderInfo;
}

/// Connect to the daemon socket from the given address
pub async fn connect(socket: &str) -> Result<Box<dyn ContainerProvider>> {
    let provider = DockerProvider::new(socket).await?;
    Ok(Box::new(provider))
}
