//! Compilation context parsing.
//!
//! ```kdl
//! compiler prefix="ci_42" base="/workspace" path="src/repo" local=#false
//! volume "cache:/cache"
//! network "shared"
//! environment { CI "true" }
//! secret "docker_password" value="hunter2" plugins-only=#true {
//!     image "plugins/docker"
//! }
//! registry "ghcr.io" username="bot" password="pw" email="bot@example.com"
//! escalate "plugins/docker" "plugins/kaniko"
//! limits mem-limit=2147483648 cpu-set="0-3"
//! ```

use kdl::{KdlDocument, KdlNode};
use std::path::Path;
use stepwright_compiler::{CompilationContext, CompilationContextBuilder};
use stepwright_core::{Registry, ResourceLimit, Secret};

use crate::nodes::{
    get_all_string_args, get_bool_prop, get_int_prop, get_string_map, get_string_prop,
    require_string_arg,
};
use crate::{ConfigError, ConfigResult};

/// Parse a compilation context from KDL text.
pub fn parse_context(kdl: &str) -> ConfigResult<CompilationContext> {
    let doc: KdlDocument = kdl.parse()?;
    let mut builder = CompilationContextBuilder::new();

    for node in doc.nodes() {
        builder = match node.name().value() {
            "compiler" => builder
                .with_prefix(get_string_prop(node, "prefix").unwrap_or_default())
                .with_workspace(
                    get_string_prop(node, "base").unwrap_or_default(),
                    get_string_prop(node, "path").unwrap_or_default(),
                )
                .with_local(get_bool_prop(node, "local").unwrap_or(false)),
            "volume" => get_all_string_args(node)
                .into_iter()
                .fold(builder, |b, volume| b.with_volume(volume)),
            "network" => get_all_string_args(node)
                .into_iter()
                .fold(builder, |b, network| b.with_network(network)),
            "environment" | "env" => get_string_map(node)
                .into_iter()
                .fold(builder, |b, (key, value)| b.with_env(key, value)),
            "secret" => builder.with_secret(parse_secret(node)?),
            "registry" => builder.with_registry(parse_registry(node)?),
            "escalate" => get_all_string_args(node)
                .into_iter()
                .fold(builder, |b, image| b.with_escalated(image)),
            "limits" => builder.with_limits(parse_limits(node)?),
            _ => builder, // Ignore unknown nodes
        };
    }

    Ok(builder.build())
}

/// Read and parse a compilation context file.
pub fn load_context(path: impl AsRef<Path>) -> ConfigResult<CompilationContext> {
    let content = std::fs::read_to_string(path)?;
    parse_context(&content)
}

fn parse_secret(node: &KdlNode) -> ConfigResult<Secret> {
    let name = require_string_arg(node, "secret name")?;
    let value = get_string_prop(node, "value")
        .ok_or_else(|| ConfigError::MissingField(format!("value for secret '{}'", name)))?;

    let mut images = Vec::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == "image" {
                images.extend(get_all_string_args(child));
            }
        }
    }

    let mut secret = Secret::new(name, value).with_allowed_images(images);
    if get_bool_prop(node, "plugins-only").unwrap_or(false) {
        secret = secret.plugins_only();
    }
    Ok(secret)
}

fn parse_registry(node: &KdlNode) -> ConfigResult<Registry> {
    Ok(Registry {
        hostname: require_string_arg(node, "registry hostname")?,
        username: get_string_prop(node, "username").unwrap_or_default(),
        password: get_string_prop(node, "password").unwrap_or_default(),
        email: get_string_prop(node, "email").unwrap_or_default(),
    })
}

/// Parse `limits` properties; shared with step manifests.
pub(crate) fn parse_limits(node: &KdlNode) -> ConfigResult<ResourceLimit> {
    Ok(ResourceLimit {
        mem_swap_limit: get_int_prop(node, "mem-swap-limit")?.unwrap_or_default(),
        mem_limit: get_int_prop(node, "mem-limit")?.unwrap_or_default(),
        shm_size: get_int_prop(node, "shm-size")?.unwrap_or_default(),
        cpu_quota: get_int_prop(node, "cpu-quota")?.unwrap_or_default(),
        cpu_shares: get_int_prop(node, "cpu-shares")?.unwrap_or_default(),
        cpu_set: get_string_prop(node, "cpu-set").unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwright_core::StepDeclaration;

    #[test]
    fn test_parse_full_context() {
        let kdl = r#"
            compiler prefix="ci_42" base="/workspace" path="src/repo" local=#true
            volume "cache:/cache" "/etc/ssl:/etc/ssl:ro"
            network "shared"
            environment {
                CI "true"
                PORT 5432
            }
            secret "Docker_Password" value="hunter2" plugins-only=#true {
                image "plugins/docker"
            }
            registry "ghcr.io" username="bot" password="pw" email="bot@example.com"
            escalate "plugins/docker" "plugins/kaniko"
            limits mem-limit=1024 cpu-set="0-3"
        "#;

        let ctx = parse_context(kdl).unwrap();
        assert_eq!(ctx.prefix, "ci_42");
        assert_eq!(ctx.base, "/workspace");
        assert_eq!(ctx.path, "src/repo");
        assert!(ctx.local);
        assert_eq!(ctx.volumes, vec!["cache:/cache", "/etc/ssl:/etc/ssl:ro"]);
        assert_eq!(ctx.networks, vec!["shared"]);
        assert_eq!(ctx.environment["CI"], "true");
        assert_eq!(ctx.environment["PORT"], "5432");
        assert_eq!(ctx.registries[0].hostname, "ghcr.io");
        assert_eq!(ctx.registries[0].email, "bot@example.com");
        assert_eq!(ctx.escalated, vec!["plugins/docker", "plugins/kaniko"]);
        assert_eq!(ctx.limits.mem_limit, 1024);
        assert_eq!(ctx.limits.cpu_set, "0-3");
        assert_eq!(ctx.limits.cpu_quota, 0);

        let secret = ctx.secrets.lookup("docker_password").unwrap();
        assert_eq!(secret.value, "hunter2");
        assert!(secret.plugins_only);
        assert_eq!(secret.allowed_images, vec!["plugins/docker"]);

        let plugin = StepDeclaration {
            image: "plugins/docker".to_string(),
            ..Default::default()
        };
        assert_eq!(ctx.secrets.available_for(&plugin).len(), 1);
    }

    #[test]
    fn test_secret_requires_value() {
        let result = parse_context(r#"secret "token""#);
        assert!(matches!(result, Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_limits_reject_non_integers() {
        let result = parse_context(r#"limits mem-limit="lots""#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
