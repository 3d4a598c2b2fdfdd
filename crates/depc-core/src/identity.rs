//! Identity file synthesis
//!
//! Copies `/etc/passwd` and `/etc/group` out of the probe container, then
//! appends one synthesized line to each host copy so in-container tools see
//! the caller's uid/gid mapping. The extracted content is preserved
//! verbatim; the files are opened in append mode and never truncated.

use crate::deadline::bounded_raw;
use crate::{CoreError, Result, Shell};
use depc_config::{ProjectKind, TargetIdentity};
use depc_provider::{ContainerId, ContainerProvider};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Container-side identity files and their host base names
const IDENTITY_FILES: [(&str, &str); 2] = [("passwd", "/etc/passwd"), ("group", "/etc/group")];

/// The fields rendered into one passwd line and one group line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub uname: String,
    pub uid: u32,
    pub gname: String,
    pub gid: u32,
    pub home: String,
    pub shell_path: String,
}

impl IdentityRecord {
    pub fn new(identity: &TargetIdentity, project: ProjectKind, shell: Shell) -> Self {
        Self {
            uname: identity.uname.clone(),
            uid: identity.uid,
            gname: identity.gname.clone(),
            gid: identity.gid,
            home: project.home_dir().to_string(),
            shell_path: shell.path().to_string(),
        }
    }

    pub fn passwd_line(&self) -> String {
        format!(
            "{}:x:{}:{}::{}:{}\n",
            self.uname, self.uid, self.gid, self.home, self.shell_path
        )
    }

    pub fn group_line(&self) -> String {
        format!("{}:x:{}:\n", self.gname, self.gid)
    }
}

/// Host paths of the synthesized identity files
#[derive(Debug, Clone)]
pub struct IdentityFiles {
    pub passwd: PathBuf,
    pub group: PathBuf,
}

/// Extract both identity files from the probe and append the synthesized
/// lines. Any failure aborts; a partially written file may remain on disk.
pub async fn synthesize(
    provider: &dyn ContainerProvider,
    probe: &ContainerId,
    record: &IdentityRecord,
    workdir: &Path,
    limit: Duration,
) -> Result<IdentityFiles> {
    for (base_name, container_path) in IDENTITY_FILES {
        let dest = workdir.join(base_name);

        bounded_raw(
            "copy_file_from",
            limit,
            provider.copy_file_from(probe, container_path, &dest),
        )
        .await?
        .map_err(|source| CoreError::FileCopyFailed {
            path: container_path.to_string(),
            source,
        })?;

        let line = match base_name {
            "passwd" => record.passwd_line(),
            _ => record.group_line(),
        };
        append_line(&dest, &line)?;
        tracing::debug!("Synthesized identity line in {}", dest.display());
    }

    Ok(IdentityFiles {
        passwd: workdir.join("passwd"),
        group: workdir.join("group"),
    })
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|source| CoreError::FileWriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
    file.write_all(line.as_bytes())
        .map_err(|source| CoreError::FileWriteFailed {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> IdentityRecord {
        IdentityRecord {
            uname: "dev".to_string(),
            uid: 1000,
            gname: "dev".to_string(),
            gid: 1000,
            home: "/home/shinto/host".to_string(),
            shell_path: "/bin/zsh".to_string(),
        }
    }

    #[test]
    fn test_passwd_line_format() {
        assert_eq!(
            record().passwd_line(),
            "dev:x:1000:1000::/home/shinto/host:/bin/zsh\n"
        );
    }

    #[test]
    fn test_group_line_format() {
        assert_eq!(record().group_line(), "dev:x:1000:\n");
    }

    #[test]
    fn test_append_preserves_existing_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("passwd");
        std::fs::write(&path, "root:x:0:0:root:/root:/bin/sh\n").unwrap();

        append_line(&path, &record().passwd_line()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "root:x:0:0:root:/root:/bin/sh\ndev:x:1000:1000::/home/shinto/host:/bin/zsh\n"
        );
    }

    #[test]
    fn test_append_missing_file_is_write_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("absent");
        assert!(matches!(
            append_line(&path, "x\n"),
            Err(CoreError::FileWriteFailed { .. })
        ));
    }

    #[test]
    fn test_record_from_parts() {
        let identity = TargetIdentity {
            uid: 1234,
            gid: 4321,
            uname: "walter".to_string(),
            gname: "staff".to_string(),
        };
        let record = IdentityRecord::new(&identity, ProjectKind::Higgs, Shell::Bash);
        assert_eq!(record.home, "/home/shinto/host");
        assert_eq!(record.shell_path, "/bin/bash");
        assert_eq!(record.passwd_line(), "walter:x:1234:4321::/home/shinto/host:/bin/bash\n");
    }
}
