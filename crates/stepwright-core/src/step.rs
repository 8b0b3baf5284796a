//! Compiled step descriptors.
//!
//! A [`Step`] is the backend-neutral, fully resolved unit of execution handed
//! to the scheduler. It is immutable once built.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::id::StepId;
use crate::resources::ResourceLimit;
use crate::{Error, Result};

/// Failure policy that aborts the pipeline.
pub const FAILURE_FAIL: &str = "fail";
/// Failure policy that lets the pipeline continue.
pub const FAILURE_IGNORE: &str = "ignore";

/// Whether a step runs to completion or as a long-lived service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Step,
    Service,
}

/// A compiled step, ready for scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Scheduling name, chosen by the caller.
    pub name: String,
    /// Fresh identifier for this compilation.
    pub uuid: StepId,
    pub kind: StepKind,
    /// Network alias, equal to the declared name.
    pub alias: String,
    pub image: String,
    pub pull: bool,
    pub detached: bool,
    pub privileged: bool,
    /// Working directory inside the container; empty when unset.
    pub working_dir: String,
    pub environment: HashMap<String, String>,
    pub commands: Vec<String>,
    pub extra_hosts: Vec<String>,
    /// Mount specs in application order.
    pub volumes: Vec<String>,
    pub tmpfs: Vec<String>,
    pub devices: Vec<String>,
    pub networks: Vec<Conn>,
    pub dns: Vec<String>,
    pub dns_search: Vec<String>,
    pub sysctls: HashMap<String, String>,
    pub limits: ResourceLimit,
    pub auth_config: Auth,
    /// Run while the pipeline is succeeding.
    pub on_success: bool,
    /// Run after the pipeline has failed.
    pub on_failure: bool,
    pub failure: String,
    pub network_mode: String,
    pub ipc_mode: String,
    pub backend_options: BackendOptions,
}

/// A network attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conn {
    pub name: String,
    pub aliases: Vec<String>,
}

/// Registry credentials for pulling the step image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl Auth {
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty() && self.email.is_empty()
    }
}

/// Backend extension options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendOptions {
    pub kubernetes: KubernetesBackendOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubernetesBackendOptions {
    pub resources: Resources,
    pub service_account_name: String,
    pub node_selector: HashMap<String, String>,
    pub tolerations: Vec<Toleration>,
}

/// Pod resource requests and limits, e.g. `cpu = "500m"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub requests: HashMap<String, String>,
    pub limits: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toleration {
    pub key: String,
    pub operator: TolerationOperator,
    pub value: String,
    pub effect: TaintEffect,
    pub toleration_seconds: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TolerationOperator {
    #[default]
    Equal,
    Exists,
}

impl FromStr for TolerationOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "Equal" => Ok(Self::Equal),
            "Exists" => Ok(Self::Exists),
            other => Err(Error::InvalidInput(format!(
                "unknown toleration operator: {}",
                other
            ))),
        }
    }
}

/// Taint effect a toleration applies to. `Any` matches every effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaintEffect {
    #[default]
    Any,
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

impl FromStr for TaintEffect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Ok(Self::Any),
            "NoSchedule" => Ok(Self::NoSchedule),
            "PreferNoSchedule" => Ok(Self::PreferNoSchedule),
            "NoExecute" => Ok(Self::NoExecute),
            other => Err(Error::InvalidInput(format!("unknown taint effect: {}", other))),
        }
    }
}
