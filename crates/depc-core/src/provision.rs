//! The provisioning pipeline
//!
//! A single run walks a linear state machine:
//! `Init → ImageResolved → ProbeUp → ShellKnown → IdentityWritten →
//! ProbeDown → ConfigWritten → FinalUp → Started`.
//! Every arrow is taken at most once; any failure moves the run to
//! `Aborted` and stops it. Probe cleanup on abort is best-effort; a final
//! container that was created but failed to start is left on the daemon.

use crate::deadline::bounded_raw;
use crate::{
    artifacts, identity, image, mounts, shell, ContainerRole, CoreError, IdentityFiles,
    IdentityRecord, ResolvedImage, Result, Shell,
};
use depc_config::{GlobalConfig, ProvisionConfig};
use depc_provider::{ContainerId, ContainerProvider, CreateContainerConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// States of a single provisioning run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionPhase {
    Init,
    ImageResolved,
    ProbeUp,
    ShellKnown,
    IdentityWritten,
    ProbeDown,
    ConfigWritten,
    FinalUp,
    Started,
    Aborted,
}

impl ProvisionPhase {
    fn step(&self) -> u8 {
        match self {
            Self::Init => 0,
            Self::ImageResolved => 1,
            Self::ProbeUp => 2,
            Self::ShellKnown => 3,
            Self::IdentityWritten => 4,
            Self::ProbeDown => 5,
            Self::ConfigWritten => 6,
            Self::FinalUp => 7,
            Self::Started => 8,
            Self::Aborted => u8::MAX,
        }
    }
}

impl std::fmt::Display for ProvisionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::ImageResolved => "image-resolved",
            Self::ProbeUp => "probe-up",
            Self::ShellKnown => "shell-known",
            Self::IdentityWritten => "identity-written",
            Self::ProbeDown => "probe-down",
            Self::ConfigWritten => "config-written",
            Self::FinalUp => "final-up",
            Self::Started => "started",
            Self::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

/// Daemon-side container liveness as tracked by the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Created,
    Running,
    Removed,
}

/// Opaque handle to a container created by this run
#[derive(Debug, Clone)]
pub struct ContainerHandle {
    pub id: ContainerId,
    pub liveness: Liveness,
}

/// Result of a successful run
#[derive(Debug)]
pub struct ProvisionOutcome {
    pub container: ContainerHandle,
    /// The run's probe; `Removed` unless best-effort cleanup failed, in
    /// which case it is still `Created` on the daemon
    pub probe: ContainerHandle,
    pub shell: Shell,
    pub identity_files: IdentityFiles,
    pub workdir: PathBuf,
    pub source_dir: PathBuf,
}

/// Drives one run-to-completion provisioning pipeline
pub struct Provisioner {
    provider: Box<dyn ContainerProvider>,
    global: GlobalConfig,
    config: ProvisionConfig,
    phase: ProvisionPhase,
    limit: Duration,
}

impl Provisioner {
    pub fn new(
        provider: Box<dyn ContainerProvider>,
        global: GlobalConfig,
        config: ProvisionConfig,
    ) -> Self {
        let limit = Duration::from_secs(global.daemon.timeout_secs);
        Self {
            provider,
            global,
            config,
            phase: ProvisionPhase::Init,
            limit,
        }
    }

    /// Current phase of the run
    pub fn phase(&self) -> ProvisionPhase {
        self.phase
    }

    /// Run the pipeline to completion. On failure the run ends in
    /// `Aborted`; already-created daemon resources are not rolled back
    /// beyond a best-effort probe removal.
    pub async fn run(&mut self) -> Result<ProvisionOutcome> {
        match self.run_pipeline().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!("Provisioning aborted in phase {}: {}", self.phase, e);
                self.phase = ProvisionPhase::Aborted;
                Err(e)
            }
        }
    }

    async fn run_pipeline(&mut self) -> Result<ProvisionOutcome> {
        let image = image::resolve(self.provider.as_ref(), &self.config.image, self.limit).await?;
        tracing::info!(
            "Resolved image {} for {}",
            image.repo_tag.as_deref().unwrap_or(image.id.reference()),
            self.config.image
        );
        self.advance(ProvisionPhase::ImageResolved);

        let mut probe = ContainerHandle {
            id: self.create_probe(&image).await?,
            liveness: Liveness::Created,
        };
        tracing::debug!("Probe container {} created", probe.id.short());
        self.advance(ProvisionPhase::ProbeUp);

        // Everything that needs the probe runs here; on failure the probe
        // is removed best-effort before the error propagates.
        let (shell, identity_files) = match self.interrogate_probe(&probe.id).await {
            Ok(result) => result,
            Err(e) => {
                self.abort_probe(&probe.id).await;
                return Err(e);
            }
        };

        // The probe is disposable: a failed removal is reported but does
        // not abort a run that already has its identity data.
        match self.remove_probe(&probe.id).await {
            Ok(()) => probe.liveness = Liveness::Removed,
            Err(e) => tracing::warn!("{} (continuing without probe cleanup)", e),
        }
        self.advance(ProvisionPhase::ProbeDown);

        artifacts::write_repoconfig(&self.config.workdir, &self.global)?;
        artifacts::copy_install_manifest(&self.config.workdir, &self.config.install_manifest)?;
        self.advance(ProvisionPhase::ConfigWritten);

        let final_id = self.create_final(&image).await?;
        tracing::debug!("Final container {} created", final_id.short());
        self.advance(ProvisionPhase::FinalUp);

        bounded_raw("start_container", self.limit, self.provider.start(&final_id))
            .await?
            .map_err(|source| CoreError::ContainerStartFailed {
                id: final_id.to_string(),
                source,
            })?;
        self.advance(ProvisionPhase::Started);
        tracing::info!(
            "Container {} started with shell {}",
            final_id.short(),
            shell
        );

        Ok(ProvisionOutcome {
            container: ContainerHandle {
                id: final_id,
                liveness: Liveness::Running,
            },
            probe,
            shell,
            identity_files,
            workdir: self.config.workdir.clone(),
            source_dir: self.config.source_dir.clone(),
        })
    }

    async fn interrogate_probe(
        &mut self,
        probe: &ContainerId,
    ) -> Result<(Shell, IdentityFiles)> {
        let shell = shell::detect(self.provider.as_ref(), probe, self.limit).await?;
        self.advance(ProvisionPhase::ShellKnown);

        let record = IdentityRecord::new(&self.config.identity, self.config.project, shell);
        let files = identity::synthesize(
            self.provider.as_ref(),
            probe,
            &record,
            &self.config.workdir,
            self.limit,
        )
        .await?;
        self.advance(ProvisionPhase::IdentityWritten);

        Ok((shell, files))
    }

    /// Probe: no mounts, no user override, entrypoint kept alive by the
    /// configured command so the filesystem can be interrogated.
    async fn create_probe(&self, image: &ResolvedImage) -> Result<ContainerId> {
        let config = CreateContainerConfig {
            image: image.id.reference().to_string(),
            name: Some(format!("{}_probe", self.config.container_name)),
            entrypoint: Some(split_command(&self.config.command)),
            labels: self.labels(),
            ..Default::default()
        };
        bounded_raw("create_container", self.limit, self.provider.create(&config))
            .await?
            .map_err(|source| CoreError::ContainerCreateFailed {
                role: ContainerRole::Probe,
                source,
            })
    }

    async fn create_final(&self, image: &ResolvedImage) -> Result<ContainerId> {
        let mut env = HashMap::new();
        env.insert("no_proxy".to_string(), self.config.no_proxy.clone());
        if self.config.run_as_root {
            env.insert("C_FORCE_ROOT".to_string(), "1".to_string());
        }

        // The process supervisor runs as root; the mounted passwd/group
        // exist for in-container tools, not for the container user.
        let config = CreateContainerConfig {
            image: image.id.reference().to_string(),
            name: Some(self.config.container_name.clone()),
            entrypoint: Some(split_command(&self.config.command)),
            env,
            user: Some("0:0".to_string()),
            mounts: mounts::plan(&self.config.workdir, &self.config.source_dir),
            labels: self.labels(),
            privileged: self.config.privileged,
            auto_remove: true,
        };
        bounded_raw("create_container", self.limit, self.provider.create(&config))
            .await?
            .map_err(|source| CoreError::ContainerCreateFailed {
                role: ContainerRole::Final,
                source,
            })
    }

    async fn remove_probe(&self, id: &ContainerId) -> Result<()> {
        bounded_raw("remove_container", self.limit, self.provider.remove(id, true))
            .await?
            .map_err(|source| CoreError::ContainerRemoveFailed {
                id: id.to_string(),
                source,
            })
    }

    async fn abort_probe(&self, id: &ContainerId) {
        if let Err(e) = self.remove_probe(id).await {
            tracing::warn!("Leaked probe container {}: {}", id.short(), e);
        }
    }

    fn labels(&self) -> HashMap<String, String> {
        HashMap::from([
            ("depc.managed".to_string(), "true".to_string()),
            ("depc.project".to_string(), self.config.project.to_string()),
        ])
    }

    fn advance(&mut self, next: ProvisionPhase) {
        debug_assert_eq!(next.step(), self.phase.step() + 1);
        tracing::debug!("Phase {} -> {}", self.phase, next);
        self.phase = next;
    }
}

fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_steps_are_linear() {
        let order = [
            ProvisionPhase::Init,
            ProvisionPhase::ImageResolved,
            ProvisionPhase::ProbeUp,
            ProvisionPhase::ShellKnown,
            ProvisionPhase::IdentityWritten,
            ProvisionPhase::ProbeDown,
            ProvisionPhase::ConfigWritten,
            ProvisionPhase::FinalUp,
            ProvisionPhase::Started,
        ];
        for (i, phase) in order.iter().enumerate() {
            assert_eq!(phase.step() as usize, i);
        }
    }

    #[test]
    fn test_split_command() {
        assert_eq!(
            split_command("tail -f /dev/null"),
            vec!["tail", "-f", "/dev/null"]
        );
        assert!(split_command("").is_empty());
    }
}
