//! Project-kind tables
//!
//! Each supported deployer project has a fixed source sub-path under the
//! caller's base directory, a fixed in-container home for the synthesized
//! identity, and a default image repository name derived from the host user.

use serde::{Deserialize, Serialize};

/// The service account every deployer image is laid out around
pub const SERVICE_HOME: &str = "/home/shinto";

/// Supported deployer project kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Konrad,
    Higgs,
    Racdb,
}

impl ProjectKind {
    pub const ALL: [ProjectKind; 3] = [ProjectKind::Konrad, ProjectKind::Higgs, ProjectKind::Racdb];

    /// Source sub-path under the caller's base directory
    pub fn src_subpath(&self) -> &'static str {
        match self {
            Self::Konrad => "compute-konrad-deployer/deployer",
            Self::Higgs => "higgs-gateway-appliance-deployer/deployer",
            Self::Racdb => "compute-rac-db-deployer/deployer",
        }
    }

    /// Home directory recorded in the synthesized passwd line
    pub fn home_dir(&self) -> &'static str {
        // All current projects share the service-user host mount
        match self {
            Self::Konrad | Self::Higgs | Self::Racdb => "/home/shinto/host",
        }
    }

    /// Default image repository name for this project and host user
    pub fn image_repository(&self, host_user: &str) -> String {
        match self {
            Self::Konrad | Self::Higgs | Self::Racdb => {
                format!("compute-deployer_dev_{}", host_user)
            }
        }
    }
}

impl std::fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Konrad => write!(f, "konrad"),
            Self::Higgs => write!(f, "higgs"),
            Self::Racdb => write!(f, "racdb"),
        }
    }
}

impl std::str::FromStr for ProjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "konrad" => Ok(Self::Konrad),
            "higgs" => Ok(Self::Higgs),
            "racdb" => Ok(Self::Racdb),
            _ => Err(format!("Unknown project kind: {}", s)),
        }
    }
}
