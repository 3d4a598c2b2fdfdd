//! Shell detection inside the probe container
//!
//! The candidate list is a fixed, explicit priority order; detection stats
//! each well-known path inside the probe's filesystem and picks the
//! highest-priority shell present.

use crate::deadline::bounded;
use crate::{CoreError, Result};
use depc_provider::{ContainerId, ContainerProvider};
use std::time::Duration;

/// Interactive shells we know how to expose, most preferred first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Zsh,
    Bash,
    Sh,
}

impl Shell {
    /// Preference order consulted during detection
    pub const PRIORITY: [Shell; 3] = [Shell::Zsh, Shell::Bash, Shell::Sh];

    /// Well-known absolute path inside the image
    pub fn path(&self) -> &'static str {
        match self {
            Self::Zsh => "/bin/zsh",
            Self::Bash => "/bin/bash",
            Self::Sh => "/bin/sh",
        }
    }
}

impl std::fmt::Display for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zsh => write!(f, "zsh"),
            Self::Bash => write!(f, "bash"),
            Self::Sh => write!(f, "sh"),
        }
    }
}

/// Detect the shell to expose for interactive access.
///
/// Stats every candidate (no execution inside the container), then selects
/// the highest-priority one found.
pub async fn detect(
    provider: &dyn ContainerProvider,
    probe: &ContainerId,
    limit: Duration,
) -> Result<Shell> {
    let mut available = Vec::new();
    for shell in Shell::PRIORITY {
        if bounded("stat_path", limit, provider.stat_path(probe, shell.path())).await? {
            available.push(shell);
        }
    }

    tracing::debug!("Shells available in image: {:?}", available);

    available
        .into_iter()
        .next()
        .ok_or(CoreError::NoShellAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert_eq!(Shell::PRIORITY[0], Shell::Zsh);
        assert_eq!(Shell::PRIORITY[1], Shell::Bash);
        assert_eq!(Shell::PRIORITY[2], Shell::Sh);
    }

    #[test]
    fn test_paths_are_absolute() {
        for shell in Shell::PRIORITY {
            assert!(shell.path().starts_with('/'));
        }
    }
}
