//! Generated run artifacts
//!
//! `repoconfig.json` carries the artifact-repository base URL and the
//! log-shipping endpoint; the caller's install manifest is copied into the
//! workdir under its well-known name. Both are written once per run.

use crate::{CoreError, Result};
use depc_config::GlobalConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct RepoConfig {
    pub repository: Repository,
    pub logstash: Logstash,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Repository {
    pub repo_base_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Logstash {
    pub host: String,
    pub port: u16,
}

impl RepoConfig {
    pub fn from_global(global: &GlobalConfig) -> Self {
        Self {
            repository: Repository {
                repo_base_url: global.repository.repo_base_url.clone(),
            },
            logstash: Logstash {
                host: global.logstash.host.clone(),
                port: global.logstash.port,
            },
        }
    }
}

/// Write `repoconfig.json` into the workdir
pub fn write_repoconfig(workdir: &Path, global: &GlobalConfig) -> Result<PathBuf> {
    let path = workdir.join("repoconfig.json");
    let content = serde_json::to_vec(&RepoConfig::from_global(global))?;
    std::fs::write(&path, content).map_err(|source| CoreError::FileWriteFailed {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Copy the caller's install manifest into the workdir as `install_json.json`
pub fn copy_install_manifest(workdir: &Path, manifest: &Path) -> Result<PathBuf> {
    let dest = workdir.join("install_json.json");
    std::fs::copy(manifest, &dest).map_err(|source| CoreError::FileWriteFailed {
        path: dest.clone(),
        source,
    })?;
    Ok(dest)
}
