//! KDL configuration parsing for Stepwright.
//!
//! This crate handles parsing of:
//! - Compilation contexts (prefix, workspace, secrets, registries, ceilings)
//! - Step manifests (service and step declarations)

pub mod context;
pub mod error;
pub mod manifest;
mod nodes;

pub use context::{load_context, parse_context};
pub use error::{ConfigError, ConfigResult};
pub use manifest::{Manifest, load_manifest, parse_manifest};
