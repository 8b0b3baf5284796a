//! The pipeline-wide compilation context.

use std::collections::HashMap;
use stepwright_core::{Registry, ResourceLimit, Secret};

use crate::secrets::SecretMap;

/// Read-only configuration shared by every step of one pipeline compile.
#[derive(Debug, Clone, Default)]
pub struct CompilationContext {
    /// Prefix for the default network and workspace volume names.
    pub prefix: String,
    /// Workspace base directory inside containers.
    pub base: String,
    /// Path of the checkout relative to `base`.
    pub path: String,
    /// Local mode skips the workspace volume.
    pub local: bool,
    /// Volumes mounted into every step.
    pub volumes: Vec<String>,
    /// Networks every step joins.
    pub networks: Vec<String>,
    /// Environment applied over every step's declared environment.
    pub environment: HashMap<String, String>,
    pub secrets: SecretMap,
    pub registries: Vec<Registry>,
    /// Plugin images that always run privileged.
    pub escalated: Vec<String>,
    /// Operator ceilings; set values override per-step limits.
    pub limits: ResourceLimit,
}

impl CompilationContext {
    pub fn builder() -> CompilationContextBuilder {
        CompilationContextBuilder::new()
    }
}

/// Builder for creating a CompilationContext.
pub struct CompilationContextBuilder {
    ctx: CompilationContext,
}

impl CompilationContextBuilder {
    pub fn new() -> Self {
        Self {
            ctx: CompilationContext::default(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ctx.prefix = prefix.into();
        self
    }

    pub fn with_workspace(mut self, base: impl Into<String>, path: impl Into<String>) -> Self {
        self.ctx.base = base.into();
        self.ctx.path = path.into();
        self
    }

    pub fn with_local(mut self, local: bool) -> Self {
        self.ctx.local = local;
        self
    }

    pub fn with_volume(mut self, volume: impl Into<String>) -> Self {
        self.ctx.volumes.push(volume.into());
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.ctx.networks.push(network.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ctx.environment.insert(key.into(), value.into());
        self
    }

    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.ctx.secrets.insert(secret);
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.ctx.registries.push(registry);
        self
    }

    pub fn with_escalated(mut self, image: impl Into<String>) -> Self {
        self.ctx.escalated.push(image.into());
        self
    }

    pub fn with_limits(mut self, limits: ResourceLimit) -> Self {
        self.ctx.limits = limits;
        self
    }

    pub fn build(self) -> CompilationContext {
        self.ctx
    }
}

impl Default for CompilationContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
