//! Step compilation for Stepwright pipelines.
//!
//! Turns parsed step declarations into fully resolved [`Step`] descriptors:
//! - Environment layering and plugin settings translation
//! - Secret scoping
//! - Registry credential selection
//! - Resource ceilings
//! - Workspace, network and volume naming
//!
//! [`Step`]: stepwright_core::Step

pub mod compiler;
pub mod context;
pub mod environment;
pub mod limits;
pub mod naming;
pub mod registry;
pub mod secrets;
pub mod settings;

pub use compiler::Compiler;
pub use context::{CompilationContext, CompilationContextBuilder};
pub use secrets::SecretMap;
pub use settings::SettingsError;
