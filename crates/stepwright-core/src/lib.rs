//! Core domain types for the Stepwright step compiler.
//!
//! This crate contains:
//! - Step declarations and their capability traits
//! - Compiled step descriptors
//! - Secrets, registries and resource limits
//! - Image reference parsing and matching

pub mod declaration;
pub mod error;
pub mod id;
pub mod image;
pub mod registry;
pub mod resources;
pub mod secret;
pub mod step;

pub use declaration::{PluginClassifier, StatusGate, StepDeclaration};
pub use error::{Error, Result};
pub use id::StepId;
pub use registry::Registry;
pub use resources::ResourceLimit;
pub use secret::{Secret, SecretScope};
pub use step::{Step, StepKind};
