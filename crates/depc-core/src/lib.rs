//! Core logic for depc container provisioning
//!
//! This crate implements the two-phase provisioning pipeline:
//! - Image resolution against the daemon's image list
//! - A short-lived probe container used to interrogate the image
//! - Shell detection inside the probe
//! - Identity file synthesis (passwd/group extraction + append)
//! - Bind-mount planning for the final container
//! - Final container creation and start

mod artifacts;
mod deadline;
mod error;
mod identity;
mod image;
mod mounts;
mod provision;
mod shell;

pub use artifacts::*;
pub use error::*;
pub use identity::*;
pub use image::*;
pub use mounts::*;
pub use provision::*;
pub use shell::*;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
