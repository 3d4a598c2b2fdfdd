//! Bind-mount planning for the final container
//!
//! A pure function of the (already validated) working and source
//! directories. All five mounts are read-write bind mounts with rprivate
//! propagation.

use depc_config::SERVICE_HOME;
use depc_provider::{BindPropagation, MountConfig, MountType};
use std::path::Path;

/// Container-side log directory
pub const LOG_TARGET: &str = "/var/log/deployer";

/// Compute the final container's bind-mount set:
/// workdir log dir, project source, the workdir itself, and the two
/// synthesized identity files over `/etc/passwd` and `/etc/group`.
pub fn plan(workdir: &Path, source_dir: &Path) -> Vec<MountConfig> {
    let bind = |source: String, target: String| MountConfig {
        mount_type: MountType::Bind,
        source,
        target,
        read_only: false,
        propagation: Some(BindPropagation::RPrivate),
    };

    vec![
        bind(
            workdir.join("log").display().to_string(),
            LOG_TARGET.to_string(),
        ),
        bind(
            source_dir.display().to_string(),
            format!("{}/deployer", SERVICE_HOME),
        ),
        bind(
            workdir.display().to_string(),
            format!("{}/host", SERVICE_HOME),
        ),
        bind(
            workdir.join("passwd").display().to_string(),
            "/etc/passwd".to_string(),
        ),
        bind(
            workdir.join("group").display().to_string(),
            "/etc/group".to_string(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn test_plan_exact_mount_set() {
        let mounts = plan(&PathBuf::from("/w"), &PathBuf::from("/s"));

        let pairs: Vec<(&str, &str)> = mounts
            .iter()
            .map(|m| (m.source.as_str(), m.target.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("/w/log", "/var/log/deployer"),
                ("/s", "/home/shinto/deployer"),
                ("/w", "/home/shinto/host"),
                ("/w/passwd", "/etc/passwd"),
                ("/w/group", "/etc/group"),
            ]
        );
    }

    #[test]
    fn test_plan_all_read_write_rprivate_binds() {
        for mount in plan(&PathBuf::from("/w"), &PathBuf::from("/s")) {
            assert_eq!(mount.mount_type, MountType::Bind);
            assert!(!mount.read_only);
            assert_eq!(mount.propagation, Some(BindPropagation::RPrivate));
        }
    }

    #[test]
    fn test_plan_no_duplicate_targets() {
        let mounts = plan(&PathBuf::from("/w"), &PathBuf::from("/s"));
        let targets: HashSet<&str> = mounts.iter().map(|m| m.target.as_str()).collect();
        assert_eq!(targets.len(), mounts.len());
    }
}
