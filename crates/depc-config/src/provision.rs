//! Provisioning input
//!
//! `ProvisionRequest` carries the raw values collected by the CLI.
//! `ProvisionConfig` is the validated form handed to depc-core: every path is
//! absolute and exists, identity fields are filled in (falling back to the
//! invoking host user), and the working directory layout is prepared.

use crate::{ConfigError, ProjectKind, Result};
use std::path::{Path, PathBuf};

/// How the image to provision from is requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageQuery {
    /// Explicit image id (substring match against daemon image ids)
    Id(String),
    /// Repository and tag substrings
    RepoTag { repository: String, tag: String },
}

impl std::fmt::Display for ImageQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::RepoTag { repository, tag } => write!(f, "{}:{}", repository, tag),
        }
    }
}

/// Identity to bake into the synthesized passwd/group lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetIdentity {
    pub uid: u32,
    pub gid: u32,
    pub uname: String,
    pub gname: String,
}

/// Raw provisioning input, before defaults and validation
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub project: ProjectKind,
    pub image_id: Option<String>,
    pub tag: String,
    pub command: String,
    pub container_name: Option<String>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub uname: String,
    pub gname: String,
    pub no_proxy: String,
    pub privileged: bool,
    pub run_as_root: bool,
    pub base_dir: PathBuf,
    pub install_manifest: PathBuf,
    pub workdir: Option<PathBuf>,
}

/// Validated provisioning input handed to the core pipeline
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    pub project: ProjectKind,
    pub image: ImageQuery,
    pub command: String,
    pub container_name: String,
    pub identity: TargetIdentity,
    pub no_proxy: String,
    pub privileged: bool,
    pub run_as_root: bool,
    pub base_dir: PathBuf,
    pub source_dir: PathBuf,
    pub install_manifest: PathBuf,
    pub workdir: PathBuf,
}

impl ProvisionConfig {
    /// Resolve a raw request into a validated config.
    ///
    /// Fills identity defaults from the host user, generates a container name
    /// and working directory when absent, canonicalises all paths, and creates
    /// the workdir layout (`log/`, `src/`) the container mounts expect.
    pub fn resolve(request: ProvisionRequest) -> Result<Self> {
        let host = host_identity()?;

        let base_dir = canonicalize_existing(&request.base_dir)?;
        let install_manifest = canonicalize_existing(&request.install_manifest)?;

        let source_dir = base_dir.join(request.project.src_subpath());
        if !source_dir.exists() {
            return Err(ConfigError::PathNotFound(source_dir));
        }
        if !source_dir.is_dir() {
            return Err(ConfigError::NotADirectory(source_dir));
        }

        let workdir = match request.workdir {
            Some(dir) => absolute(&dir),
            None => {
                let cwd = std::env::current_dir()
                    .map_err(|e| ConfigError::Invalid(format!("cannot determine cwd: {}", e)))?;
                unique_workdir(&cwd)
            }
        };
        prepare_workdir(&workdir)?;

        let image = match request.image_id {
            Some(id) => ImageQuery::Id(id),
            None => ImageQuery::RepoTag {
                repository: request.project.image_repository(&host.username),
                tag: request.tag,
            },
        };

        Ok(Self {
            project: request.project,
            image,
            command: request.command,
            container_name: request
                .container_name
                .unwrap_or_else(default_container_name),
            identity: TargetIdentity {
                uid: request.uid.unwrap_or(host.uid),
                gid: request.gid.unwrap_or(host.gid),
                uname: request.uname,
                gname: request.gname,
            },
            no_proxy: request.no_proxy,
            privileged: request.privileged,
            run_as_root: request.run_as_root,
            base_dir,
            source_dir,
            install_manifest,
            workdir,
        })
    }
}

/// Identity of the invoking host user
#[derive(Debug, Clone)]
pub struct HostIdentity {
    pub uid: u32,
    pub gid: u32,
    pub username: String,
}

/// Look up the invoking user via the host passwd database
pub fn host_identity() -> Result<HostIdentity> {
    let uid = nix::unistd::Uid::current();
    let gid = nix::unistd::Gid::current();
    let user = nix::unistd::User::from_uid(uid)
        .map_err(|e| ConfigError::HostIdentity(e.to_string()))?
        .ok_or_else(|| ConfigError::HostIdentity(format!("no passwd entry for uid {}", uid)))?;
    Ok(HostIdentity {
        uid: uid.as_raw(),
        gid: gid.as_raw(),
        username: user.name,
    })
}

/// Default container name: `deployer_<local timestamp>`
pub fn default_container_name() -> String {
    format!("deployer_{}", chrono::Local::now().format("%b%d%a%H%M%S"))
}

/// Pick a fresh working directory under `base`.
///
/// The suffix comes from a per-run random id rather than any process-global
/// state; collisions retry with a new id.
pub fn unique_workdir(base: &Path) -> PathBuf {
    loop {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let candidate = base.join(format!("deployer-{}", &suffix[..8]));
        if !candidate.exists() {
            return candidate;
        }
    }
}

/// Create the workdir and the `log`/`src` subdirectories the mounts expect
pub fn prepare_workdir(workdir: &Path) -> Result<()> {
    for dir in [workdir.to_path_buf(), workdir.join("log"), workdir.join("src")] {
        std::fs::create_dir_all(&dir).map_err(|source| ConfigError::WorkdirError {
            path: dir.clone(),
            source,
        })?;
    }
    Ok(())
}

fn canonicalize_existing(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|_| ConfigError::PathNotFound(path.to_path_buf()))
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_in(tmp: &Path) -> ProvisionRequest {
        let base = tmp.join("base");
        std::fs::create_dir_all(base.join(ProjectKind::Konrad.src_subpath())).unwrap();
        let manifest = tmp.join("install_json.json");
        std::fs::write(&manifest, "{}").unwrap();
        ProvisionRequest {
            project: ProjectKind::Konrad,
            image_id: None,
            tag: "latest".to_string(),
            command: "tail -f /dev/null".to_string(),
            container_name: None,
            uid: Some(1000),
            gid: Some(1000),
            uname: "deployer".to_string(),
            gname: "deployer".to_string(),
            no_proxy: "localhost,127.0.0.1".to_string(),
            privileged: false,
            run_as_root: false,
            base_dir: base,
            install_manifest: manifest,
            workdir: Some(tmp.join("work")),
        }
    }

    #[test]
    fn test_resolve_prepares_workdir_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ProvisionConfig::resolve(request_in(tmp.path())).unwrap();
        assert!(config.workdir.join("log").is_dir());
        assert!(config.workdir.join("src").is_dir());
        assert!(config.source_dir.ends_with("compute-konrad-deployer/deployer"));
        assert!(config.container_name.starts_with("deployer_"));
    }

    #[test]
    fn test_resolve_missing_source_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mut request = request_in(tmp.path());
        request.project = ProjectKind::Racdb; // src subpath not created
        assert!(matches!(
            ProvisionConfig::resolve(request),
            Err(ConfigError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_missing_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let mut request = request_in(tmp.path());
        request.install_manifest = tmp.path().join("missing.json");
        assert!(matches!(
            ProvisionConfig::resolve(request),
            Err(ConfigError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_explicit_image_id_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let mut request = request_in(tmp.path());
        request.image_id = Some("abc123".to_string());
        let config = ProvisionConfig::resolve(request).unwrap();
        assert_eq!(config.image, ImageQuery::Id("abc123".to_string()));
    }

    #[test]
    fn test_unique_workdir_avoids_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let first = unique_workdir(tmp.path());
        let second = unique_workdir(tmp.path());
        assert!(first.starts_with(tmp.path()));
        // Overwhelmingly likely distinct even without creating the first
        assert_ne!(first, second);
    }
}
