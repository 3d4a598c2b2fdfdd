//! Configuration layer for depc
//!
//! This crate handles:
//! - Global configuration (`~/.config/depc/config.toml`)
//! - Project-kind tables (source layout, in-container home, image repository)
//! - Building and validating the provisioning input handed to depc-core

mod error;
mod global;
mod project;
mod provision;

pub use error::*;
pub use global::*;
pub use project::*;
pub use provision::*;
