//! Docker provider implementation using bollard

use crate::{
    BindPropagation, ContainerId, ContainerProvider, CreateContainerConfig, ImageId, ImageSummary,
    MountType, ProviderError, ProviderInfo, ProviderType, Result,
};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, DownloadFromContainerOptions, RemoveContainerOptions,
    StartContainerOptions,
};
use bollard::image::ListImagesOptions;
use bollard::service::{HostConfig, Mount, MountBindOptions, MountBindOptionsPropagationEnum};
use bollard::Docker;
use futures::StreamExt;
use std::io::Read;
use std::path::Path;

/// Docker provider using the bollard crate
pub struct DockerProvider {
    client: Docker,
    provider_type: ProviderType,
}

impl DockerProvider {
    /// Create a new Docker provider
    pub async fn new(socket_path: &str) -> Result<Self> {
        let client = if socket_path.starts_with("unix://") || socket_path.starts_with('/') {
            let path = socket_path.trim_start_matches("unix://");
            Docker::connect_with_socket(path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| ProviderError::ConnectionError(e.to_string()))?
        } else if socket_path.starts_with("http://") || socket_path.starts_with("https://") {
            Docker::connect_with_http(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| ProviderError::ConnectionError(e.to_string()))?
        } else {
            // Assume it's a unix socket path
            Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| ProviderError::ConnectionError(e.to_string()))?
        };

        // Test connection
        client
            .ping()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            provider_type: ProviderType::Docker,
        })
    }

    /// Create a new provider for Podman (uses the Docker-compatible API)
    pub async fn new_podman(socket_path: &str) -> Result<Self> {
        let mut provider = Self::new(socket_path).await?;
        provider.provider_type = ProviderType::Podman;
        Ok(provider)
    }

    /// Get the underlying Docker client
    pub fn client(&self) -> &Docker {
        &self.client
    }
}

#[async_trait]
impl ContainerProvider for DockerProvider {
    async fn ping(&self) -> Result<()> {
        self.client
            .ping()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;
        Ok(())
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        let options = ListImagesOptions::<String> {
            all: false,
            ..Default::default()
        };
        let images = self.client.list_images(Some(options)).await?;

        Ok(images
            .into_iter()
            .map(|i| ImageSummary {
                id: ImageId::new(i.id),
                repo_tags: i.repo_tags,
                created: i.created,
            })
            .collect())
    }

    async fn create(&self, config: &CreateContainerConfig) -> Result<ContainerId> {
        let options = config.name.as_ref().map(|name| CreateContainerOptions {
            name: name.as_str(),
            platform: None,
        });

        let mounts: Vec<Mount> = config
            .mounts
            .iter()
            .map(|m| Mount {
                target: Some(m.target.clone()),
                source: Some(m.source.clone()),
                typ: Some(match m.mount_type {
                    MountType::Bind => bollard::service::MountTypeEnum::BIND,
                    MountType::Volume => bollard::service::MountTypeEnum::VOLUME,
                    MountType::Tmpfs => bollard::service::MountTypeEnum::TMPFS,
                }),
                read_only: Some(m.read_only),
                bind_options: m.propagation.map(|p| MountBindOptions {
                    propagation: Some(match p {
                        BindPropagation::Private => MountBindOptionsPropagationEnum::PRIVATE,
                        BindPropagation::RPrivate => MountBindOptionsPropagationEnum::RPRIVATE,
                        BindPropagation::Shared => MountBindOptionsPropagationEnum::SHARED,
                        BindPropagation::RShared => MountBindOptionsPropagationEnum::RSHARED,
                        BindPropagation::Slave => MountBindOptionsPropagationEnum::SLAVE,
                        BindPropagation::RSlave => MountBindOptionsPropagationEnum::RSLAVE,
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .collect();

        let host_config = HostConfig {
            mounts: if mounts.is_empty() {
                None
            } else {
                Some(mounts)
            },
            privileged: Some(config.privileged),
            auto_remove: Some(config.auto_remove),
            ..Default::default()
        };

        let env: Vec<String> = config
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let container_config = Config {
            image: Some(config.image.clone()),
            entrypoint: config.entrypoint.clone(),
            env: if env.is_empty() { None } else { Some(env) },
            user: config.user.clone(),
            labels: if config.labels.is_empty() {
                None
            } else {
                Some(config.labels.clone())
            },
            host_config: Some(host_config),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(options, container_config)
            .await
            .map_err(|e| ProviderError::CreateError(e.to_string()))?;

        Ok(ContainerId::new(response.id))
    }

    async fn start(&self, id: &ContainerId) -> Result<()> {
        self.client
            .start_container(&id.0, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn remove(&self, id: &ContainerId, force: bool) -> Result<()> {
        let options = RemoveContainerOptions {
            force,
            ..Default::default()
        };
        self.client.remove_container(&id.0, Some(options)).await?;
        Ok(())
    }

    async fn stat_path(&self, id: &ContainerId, path: &str) -> Result<bool> {
        // bollard exposes no archive-stat call, so answer existence by
        // opening an archive download against the path and reading one chunk.
        let options = DownloadFromContainerOptions { path };
        let mut stream = self.client.download_from_container(&id.0, Some(options));
        stat_outcome(stream.next().await)
    }

    async fn copy_file_from(&self, id: &ContainerId, src: &str, dest: &Path) -> Result<()> {
        let options = DownloadFromContainerOptions { path: src };
        let mut stream = self.client.download_from_container(&id.0, Some(options));

        let mut tar_data = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            tar_data.extend_from_slice(&chunk);
        }

        extract_single_file(&tar_data, dest)
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            provider_type: self.provider_type,
            api_version: bollard::API_DEFAULT_VERSION.to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// Interpret the first chunk of an archive download as a path-existence
/// answer. Only a 404 means the path is absent; any other daemon error
/// propagates so it cannot masquerade as a missing file.
fn stat_outcome<T>(
    chunk: Option<std::result::Result<T, bollard::errors::Error>>,
) -> Result<bool> {
    match chunk {
        Some(Ok(_)) => Ok(true),
        Some(Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        })) => Ok(false),
        Some(Err(e)) => Err(e.into()),
        None => Ok(false),
    }
}

/// Extract the first regular file entry of a tar archive to `dest`.
///
/// The daemon packs a single-file copy as an archive with one entry; the
/// entry name inside the archive is the container-side base name.
fn extract_single_file(tar_data: &[u8], dest: &Path) -> Result<()> {
    use std::io::Cursor;
    use tar::Archive;

    let cursor = Cursor::new(tar_data);
    let mut archive = Archive::new(cursor);

    for entry in archive.entries().map_err(ProviderError::IoError)? {
        let mut entry = entry.map_err(ProviderError::IoError)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(ProviderError::IoError)?;
        std::fs::write(dest, content).map_err(ProviderError::IoError)?;
        return Ok(());
    }

    Err(ProviderError::RuntimeError(format!(
        "archive for {} contained no file entry",
        dest.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tar_with_file(name: &str, content: &[u8]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, content).unwrap();
        builder.into_inner().unwrap()
    }

    #[test]
    fn test_extract_single_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("passwd");
        let data = tar_with_file("passwd", b"root:x:0:0:root:/root:/bin/sh\n");
        extract_single_file(&data, &dest).unwrap();
        assert_eq!(
            std::fs::read(&dest).unwrap(),
            b"root:x:0:0:root:/root:/bin/sh\n"
        );
    }

    fn server_error(status_code: u16, message: &str) -> bollard::errors::Error {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_stat_outcome_chunk_means_present() {
        assert!(stat_outcome(Some(Ok(vec![0u8]))).unwrap());
    }

    #[test]
    fn test_stat_outcome_404_means_absent() {
        let outcome = stat_outcome::<Vec<u8>>(Some(Err(server_error(404, "no such file"))));
        assert!(!outcome.unwrap());
    }

    #[test]
    fn test_stat_outcome_other_server_errors_propagate() {
        let outcome = stat_outcome::<Vec<u8>>(Some(Err(server_error(503, "daemon overloaded"))));
        assert!(matches!(outcome, Err(ProviderError::RuntimeError(_))));
    }

    #[test]
    fn test_stat_outcome_empty_stream_means_absent() {
        assert!(!stat_outcome::<Vec<u8>>(None).unwrap());
    }

    #[test]
    fn test_extract_empty_archive_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("group");
        let empty = tar::Builder::new(Vec::new()).into_inner().unwrap();
        assert!(extract_single_file(&empty, &dest).is_err());
        assert!(!dest.exists());
    }
}
