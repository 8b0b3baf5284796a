//! Step manifest parsing.
//!
//! A manifest lists `service` and `step` declarations:
//!
//! ```kdl
//! service "db" {
//!     image "postgres:16"
//!     environment { POSTGRES_PASSWORD "ci" }
//! }
//!
//! step "test" {
//!     image "rust:1.85"
//!     commands "cargo test"
//!     secrets { secret "token" target="api_key" }
//! }
//!
//! step "publish" {
//!     image "plugins/docker"
//!     settings {
//!         repo "org/app"
//!         tags "latest" "1.0"
//!         password from-secret="docker_password"
//!     }
//!     when status="success"
//! }
//! ```

use kdl::{KdlDocument, KdlNode};
use std::collections::BTreeMap;
use std::path::Path;
use stepwright_core::StepDeclaration;
use stepwright_core::declaration::{
    Constraint, DeclBackendOptions, DeclKubernetesOptions, DeclToleration, SecretRequest, Volume,
    When,
};
use stepwright_core::step::{TaintEffect, TolerationOperator};

use crate::context::parse_limits;
use crate::nodes::{
    get_all_string_args, get_first_string_arg, get_flag, get_int_prop, get_string_list_prop,
    get_string_map, get_string_prop, node_to_json, parse_prop, require_string_arg,
};
use crate::{ConfigError, ConfigResult};

/// Declarations of one pipeline, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub services: Vec<StepDeclaration>,
    pub steps: Vec<StepDeclaration>,
}

/// Parse a step manifest from KDL text.
pub fn parse_manifest(kdl: &str) -> ConfigResult<Manifest> {
    let doc: KdlDocument = kdl.parse()?;
    let mut manifest = Manifest::default();

    for node in doc.nodes() {
        match node.name().value() {
            "service" => manifest.services.push(parse_declaration(node)?),
            "step" => manifest.steps.push(parse_declaration(node)?),
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(manifest)
}

/// Read and parse a step manifest file.
pub fn load_manifest(path: impl AsRef<Path>) -> ConfigResult<Manifest> {
    let content = std::fs::read_to_string(path)?;
    parse_manifest(&content)
}

fn parse_declaration(node: &KdlNode) -> ConfigResult<StepDeclaration> {
    let name = require_string_arg(node, &format!("{} name", node.name().value()))?;
    let mut decl = StepDeclaration {
        name,
        ..Default::default()
    };

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "image" => decl.image = get_first_string_arg(child).unwrap_or_default(),
                "pull" => decl.pull = get_flag(child)?,
                "commands" | "command" => decl.commands.extend(get_all_string_args(child)),
                "directory" => decl.directory = get_first_string_arg(child).unwrap_or_default(),
                "detach" => decl.detached = get_flag(child)?,
                "privileged" => decl.privileged = get_flag(child)?,
                "network-mode" => {
                    decl.network_mode = get_first_string_arg(child).unwrap_or_default()
                }
                "ipc-mode" => decl.ipc_mode = get_first_string_arg(child).unwrap_or_default(),
                "extra-hosts" => decl.extra_hosts.extend(get_all_string_args(child)),
                "volumes" => {
                    for spec in get_all_string_args(child) {
                        let volume = Volume::parse(&spec).map_err(|e| ConfigError::InvalidValue {
                            field: format!("volumes of '{}'", decl.name),
                            message: e.to_string(),
                        })?;
                        decl.volumes.push(volume);
                    }
                }
                "tmpfs" => decl.tmpfs.extend(get_all_string_args(child)),
                "devices" => decl.devices.extend(get_all_string_args(child)),
                "dns" => decl.dns.extend(get_all_string_args(child)),
                "dns-search" => decl.dns_search.extend(get_all_string_args(child)),
                "sysctls" => decl.sysctls.extend(get_string_map(child)),
                "limits" => decl.limits = parse_limits(child)?,
                "environment" | "env" => decl.environment.extend(get_string_map(child)),
                "settings" => decl.settings = parse_settings(child),
                "secrets" => decl.secrets.extend(parse_secret_requests(child)?),
                "when" => decl.when = parse_when(child),
                "failure" => decl.failure = get_first_string_arg(child).unwrap_or_default(),
                "backend-options" => decl.backend_options = parse_backend_options(child)?,
                _ => {}
            }
        }
    }

    if decl.image.is_empty() {
        return Err(ConfigError::MissingField(format!(
            "image for '{}'",
            decl.name
        )));
    }

    Ok(decl)
}

fn parse_settings(node: &KdlNode) -> BTreeMap<String, serde_json::Value> {
    node.children()
        .map(|children| {
            children
                .nodes()
                .iter()
                .map(|child| (child.name().value().to_string(), node_to_json(child)))
                .collect()
        })
        .unwrap_or_default()
}

// `secrets "a" "b"` exposes each secret under its own name;
// `secret "a" target="b"` children rename it.
fn parse_secret_requests(node: &KdlNode) -> ConfigResult<Vec<SecretRequest>> {
    let mut requests: Vec<SecretRequest> = get_all_string_args(node)
        .into_iter()
        .map(|source| SecretRequest {
            target: source.clone(),
            source,
        })
        .collect();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() != "secret" {
                continue;
            }
            let source = require_string_arg(child, "secret source")?;
            let target = get_string_prop(child, "target").unwrap_or_else(|| source.clone());
            requests.push(SecretRequest { source, target });
        }
    }

    Ok(requests)
}

fn parse_when(node: &KdlNode) -> When {
    let mut constraints: Vec<Constraint> = node
        .children()
        .map(|children| {
            children
                .nodes()
                .iter()
                .filter(|c| c.name().value() == "constraint")
                .map(|c| Constraint {
                    status: get_string_list_prop(c, "status"),
                })
                .collect()
        })
        .unwrap_or_default();

    if constraints.is_empty() {
        constraints.push(Constraint {
            status: get_string_list_prop(node, "status"),
        });
    }

    When { constraints }
}

fn parse_backend_options(node: &KdlNode) -> ConfigResult<DeclBackendOptions> {
    let mut options = DeclBackendOptions::default();
    let Some(children) = node.children() else {
        return Ok(options);
    };

    for child in children.nodes() {
        if child.name().value() == "kubernetes" {
            options.kubernetes = parse_kubernetes_options(child)?;
        }
    }

    Ok(options)
}

fn parse_kubernetes_options(node: &KdlNode) -> ConfigResult<DeclKubernetesOptions> {
    let mut options = DeclKubernetesOptions::default();
    let Some(children) = node.children() else {
        return Ok(options);
    };

    for child in children.nodes() {
        match child.name().value() {
            "service-account" => {
                options.service_account_name = get_first_string_arg(child).unwrap_or_default()
            }
            "node-selector" => options.node_selector.extend(get_string_map(child)),
            "resources" => {
                if let Some(sections) = child.children() {
                    for section in sections.nodes() {
                        match section.name().value() {
                            "requests" => options.requests.extend(get_string_map(section)),
                            "limits" => options.limits.extend(get_string_map(section)),
                            _ => {}
                        }
                    }
                }
            }
            "toleration" => options.tolerations.push(parse_toleration(child)?),
            _ => {}
        }
    }

    Ok(options)
}

fn parse_toleration(node: &KdlNode) -> ConfigResult<DeclToleration> {
    Ok(DeclToleration {
        key: get_first_string_arg(node).unwrap_or_default(),
        operator: parse_prop::<TolerationOperator>(node, "operator")?.unwrap_or_default(),
        value: get_string_prop(node, "value").unwrap_or_default(),
        effect: parse_prop::<TaintEffect>(node, "effect")?.unwrap_or_default(),
        toleration_seconds: get_int_prop(node, "seconds")?,
    })
}
