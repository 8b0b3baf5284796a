//! Step declarations as authored in a pipeline manifest.
//!
//! A declaration is consumed exactly once by the step compiler. Conditional
//! execution rules and plugin classification are exposed through the
//! [`StatusGate`] and [`PluginClassifier`] capabilities so the compiler never
//! evaluates them itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::resources::ResourceLimit;
use crate::step::{TaintEffect, TolerationOperator};

/// Status value that gates a step on pipeline success.
pub const STATUS_SUCCESS: &str = "success";
/// Status value that gates a step on pipeline failure.
pub const STATUS_FAILURE: &str = "failure";

/// Answers whether a step should run for a given pipeline outcome.
pub trait StatusGate {
    /// Whether the step runs while the pipeline is succeeding.
    fn includes_status_success(&self) -> bool;

    /// Whether the step runs after the pipeline has failed.
    fn includes_status_failure(&self) -> bool;
}

/// Classifies a declaration as plugin-style (configured by settings) or not.
pub trait PluginClassifier {
    fn is_plugin(&self) -> bool;
}

/// A user-authored step or service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepDeclaration {
    /// Declared name; becomes the network alias of the compiled step.
    pub name: String,
    /// Container image to run.
    pub image: String,
    /// Always pull the image before running.
    pub pull: bool,
    /// Commands to execute. Empty for plugin-style steps.
    pub commands: Vec<String>,
    /// Working directory override, absolute or relative to the workspace.
    pub directory: String,
    /// Run in the background alongside later steps.
    pub detached: bool,
    pub privileged: bool,
    pub network_mode: String,
    pub ipc_mode: String,
    pub extra_hosts: Vec<String>,
    pub volumes: Vec<Volume>,
    pub tmpfs: Vec<String>,
    pub devices: Vec<String>,
    pub dns: Vec<String>,
    pub dns_search: Vec<String>,
    pub sysctls: HashMap<String, String>,
    /// Resource limits requested by the step.
    pub limits: ResourceLimit,
    pub environment: HashMap<String, String>,
    /// Plugin parameters, translated into `PLUGIN_*` environment variables.
    pub settings: BTreeMap<String, Value>,
    /// Named secrets to expose as environment variables.
    pub secrets: Vec<SecretRequest>,
    pub backend_options: DeclBackendOptions,
    /// Failure policy; empty means the default.
    pub failure: String,
    pub when: When,
}

impl PluginClassifier for StepDeclaration {
    fn is_plugin(&self) -> bool {
        self.commands.is_empty()
    }
}

/// A volume mount declared on a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub source: String,
    pub destination: String,
    pub access_mode: String,
}

impl Volume {
    /// Parse a `source:destination[:mode]` mount spec.
    pub fn parse(spec: &str) -> crate::Result<Self> {
        let parts: Vec<&str> = spec.split(':').collect();
        let (source, destination, access_mode) = match parts.as_slice() {
            [destination] => ("", *destination, ""),
            [source, destination] => (*source, *destination, ""),
            [source, destination, mode] => (*source, *destination, *mode),
            _ => {
                return Err(crate::Error::InvalidInput(format!(
                    "volume '{}' has too many components",
                    spec
                )));
            }
        };
        if destination.is_empty() {
            return Err(crate::Error::InvalidInput(format!(
                "volume '{}' has no destination",
                spec
            )));
        }
        Ok(Self {
            source: source.to_string(),
            destination: destination.to_string(),
            access_mode: access_mode.to_string(),
        })
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source.is_empty() {
            return write!(f, "{}", self.destination);
        }
        if self.access_mode.is_empty() {
            return write!(f, "{}:{}", self.source, self.destination);
        }
        write!(f, "{}:{}:{}", self.source, self.destination, self.access_mode)
    }
}

/// A request to expose the secret `source` as environment variable `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRequest {
    pub source: String,
    pub target: String,
}

/// Conditions under which a step runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct When {
    pub constraints: Vec<Constraint>,
}

/// One alternative of a `when` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constraint {
    pub status: Vec<String>,
}

impl StatusGate for When {
    // No constraints, or any constraint without a status list, runs on success.
    fn includes_status_success(&self) -> bool {
        self.constraints.is_empty()
            || self
                .constraints
                .iter()
                .any(|c| c.status.is_empty() || c.status.iter().any(|s| s == STATUS_SUCCESS))
    }

    fn includes_status_failure(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| c.status.iter().any(|s| s == STATUS_FAILURE))
    }
}

/// Backend-specific options as declared on a step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclBackendOptions {
    pub kubernetes: DeclKubernetesOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclKubernetesOptions {
    pub requests: HashMap<String, String>,
    pub limits: HashMap<String, String>,
    pub service_account_name: String,
    pub node_selector: HashMap<String, String>,
    pub tolerations: Vec<DeclToleration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclToleration {
    pub key: String,
    pub operator: TolerationOperator,
    pub value: String,
    pub effect: TaintEffect,
    pub toleration_seconds: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn when(statuses: &[&[&str]]) -> When {
        When {
            constraints: statuses
                .iter()
                .map(|s| Constraint {
                    status: s.iter().map(|v| v.to_string()).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_empty_when_runs_on_success_only() {
        let w = When::default();
        assert!(w.includes_status_success());
        assert!(!w.includes_status_failure());
    }

    #[test]
    fn test_failure_only_constraint() {
        let w = when(&[&["failure"]]);
        assert!(!w.includes_status_success());
        assert!(w.includes_status_failure());
    }

    #[test]
    fn test_constraint_without_status_includes_success() {
        let w = when(&[&["failure"], &[]]);
        assert!(w.includes_status_success());
        assert!(w.includes_status_failure());
    }

    #[test]
    fn test_plugin_classification() {
        let mut decl = StepDeclaration {
            image: "plugins/docker".to_string(),
            ..Default::default()
        };
        assert!(decl.is_plugin());
        decl.commands.push("make".to_string());
        assert!(!decl.is_plugin());
    }

    #[test]
    fn test_volume_rendering() {
        assert_eq!(Volume::parse("/cache").unwrap().to_string(), "/cache");
        assert_eq!(Volume::parse("cache:/cache").unwrap().to_string(), "cache:/cache");
        assert_eq!(
            Volume::parse("/etc/ssl:/etc/ssl:ro").unwrap().to_string(),
            "/etc/ssl:/etc/ssl:ro"
        );
        assert!(Volume::parse("a:b:c:d").is_err());
        assert!(Volume::parse("cache:").is_err());
    }
}
